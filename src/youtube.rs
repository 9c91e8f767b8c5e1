//! YouTube link handling: video-id extraction and thumbnail derivation.

const WATCH_PARAM: &str = "v=";
const SHORT_HOST: &str = "youtu.be/";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Extracts the YouTube video id from a submitted link.
///
/// Recognizes the `v=<id>` query form and the `youtu.be/<id>` short form;
/// the id is the run of `[A-Za-z0-9_-]` characters following whichever
/// marker appears first. Returns `None` when neither form matches.
pub fn derive_youtube_id(link: &str) -> Option<String> {
    let watch = link.find(WATCH_PARAM).map(|i| i + WATCH_PARAM.len());
    let short = link.find(SHORT_HOST).map(|i| i + SHORT_HOST.len());

    let start = match (watch, short) {
        (Some(w), Some(s)) => w.min(s),
        (Some(w), None) => w,
        (None, Some(s)) => s,
        (None, None) => return None,
    };

    let id: String = link[start..].chars().take_while(|c| is_id_char(*c)).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Canonical YouTube thumbnail URL for a video id.
pub fn thumbnail_url(youtube_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", youtube_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_watch_url() {
        assert_eq!(
            derive_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_short_url() {
        assert_eq!(
            derive_youtube_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn trailing_query_parameters_do_not_leak_into_id() {
        assert_eq!(
            derive_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            derive_youtube_id("https://youtu.be/abc123?si=share"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn underscore_and_dash_are_part_of_the_id() {
        assert_eq!(
            derive_youtube_id("https://youtu.be/a_b-c"),
            Some("a_b-c".to_string())
        );
    }

    #[test]
    fn earliest_marker_wins_when_both_forms_appear() {
        assert_eq!(
            derive_youtube_id("https://youtu.be/first?v=second"),
            Some("first".to_string())
        );
    }

    #[test]
    fn rejects_links_without_either_form() {
        assert_eq!(derive_youtube_id("not-a-youtube-url"), None);
        assert_eq!(derive_youtube_id("https://vimeo.com/12345"), None);
        assert_eq!(derive_youtube_id(""), None);
    }

    #[test]
    fn rejects_empty_id_candidates() {
        assert_eq!(derive_youtube_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(derive_youtube_id("https://youtu.be/"), None);
    }

    #[test]
    fn thumbnail_url_is_canonical() {
        assert_eq!(
            thumbnail_url("abc123"),
            "https://img.youtube.com/vi/abc123/hqdefault.jpg"
        );
    }
}
