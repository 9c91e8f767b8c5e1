use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::utils::timeout_query;
use crate::youtube::{derive_youtube_id, thumbnail_url};
use crate::InnerState;

const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(10_000);

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub youtube_link: String,
    pub youtube_id: String,
    pub thumbnail_url: String,
    pub published: bool,
    pub published_at: NaiveDateTime,
}

/// Admin-submitted payload for create and update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload {
    pub title: String,
    pub youtube_link: String,
}

/// All videos, newest first. The `published` flag is not a filter here.
pub(crate) async fn fetch_videos(db: &PgPool) -> Result<Vec<Video>, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(r#"SELECT * FROM videos ORDER BY published_at DESC"#)
            .fetch_all(db),
    )
    .await
}

pub(crate) async fn fetch_video(db: &PgPool, video_id: i64) -> Result<Video, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(r#"SELECT * FROM videos WHERE id = $1"#)
            .bind(video_id)
            .fetch_optional(db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

pub(crate) async fn fetch_latest_video(db: &PgPool) -> Result<Option<Video>, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(
            r#"SELECT * FROM videos ORDER BY published_at DESC LIMIT 1"#,
        )
        .fetch_optional(db),
    )
    .await
}

#[tracing::instrument(name = "Create video", skip(inner, payload), fields(title = %payload.title))]
pub async fn create_video(
    State(inner): State<InnerState>,
    Json(payload): Json<VideoPayload>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    tracing::info!("Creating video '{}'", payload.title);
    let InnerState { db, .. } = inner;

    let youtube_id = derive_youtube_id(&payload.youtube_link)
        .ok_or_else(|| AppError::Validation("Invalid YouTube link".to_string()))?;
    let thumbnail = thumbnail_url(&youtube_id);
    tracing::debug!("Derived YouTube id '{}'", youtube_id);

    let video = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(
            r#"INSERT INTO videos (title, youtube_link, youtube_id, thumbnail_url)
               VALUES ($1, $2, $3, $4) RETURNING *"#,
        )
        .bind(&payload.title)
        .bind(&payload.youtube_link)
        .bind(&youtube_id)
        .bind(&thumbnail)
        .fetch_one(&db),
    )
    .await?;

    tracing::info!("Created video {} ('{}')", video.id, video.title);
    Ok((StatusCode::CREATED, Json(video)))
}

#[tracing::instrument(name = "List all videos", skip(inner))]
pub async fn all_videos(State(inner): State<InnerState>) -> Result<Json<Vec<Video>>, AppError> {
    let InnerState { db, .. } = inner;

    let videos = fetch_videos(&db).await?;
    tracing::debug!("Returning {} videos", videos.len());
    Ok(Json(videos))
}

#[tracing::instrument(name = "List published videos", skip(inner))]
pub async fn published_videos(
    State(inner): State<InnerState>,
) -> Result<Json<Vec<Video>>, AppError> {
    let InnerState { db, .. } = inner;

    let videos = fetch_videos(&db).await?;
    Ok(Json(videos))
}

#[tracing::instrument(name = "Update video", skip(inner, payload), fields(video_id = %video_id, title = %payload.title))]
pub async fn update_video(
    State(inner): State<InnerState>,
    Path(video_id): Path<i64>,
    Json(payload): Json<VideoPayload>,
) -> Result<Json<Video>, AppError> {
    tracing::info!("Updating video {}", video_id);
    let InnerState { db, .. } = inner;

    // Re-derive id and thumbnail together so they never diverge from the link.
    let youtube_id = derive_youtube_id(&payload.youtube_link)
        .ok_or_else(|| AppError::Validation("Invalid YouTube link".to_string()))?;
    let thumbnail = thumbnail_url(&youtube_id);

    let updated = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(
            r#"UPDATE videos
               SET title = $2, youtube_link = $3, youtube_id = $4, thumbnail_url = $5
               WHERE id = $1 RETURNING *"#,
        )
        .bind(video_id)
        .bind(&payload.title)
        .bind(&payload.youtube_link)
        .bind(&youtube_id)
        .bind(&thumbnail)
        .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    tracing::info!("Updated video {}", updated.id);
    Ok(Json(updated))
}

#[tracing::instrument(name = "Delete video", skip(inner), fields(video_id = %video_id))]
pub async fn delete_video(
    State(inner): State<InnerState>,
    Path(video_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let InnerState { db, .. } = inner;

    let result = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query(r#"DELETE FROM videos WHERE id = $1"#)
            .bind(video_id)
            .execute(&db),
    )
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!("Delete requested for missing video {}", video_id);
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    tracing::info!("Deleted video {}", video_id);
    Ok(StatusCode::NO_CONTENT)
}
