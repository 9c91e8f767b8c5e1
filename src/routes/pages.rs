//! Public page endpoints. Template rendering lives outside this service, so
//! these return the data the page is rendered from, or a redirect.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::routes::videos::{fetch_latest_video, fetch_video, fetch_videos, Video};
use crate::utils::redirect_found;
use crate::InnerState;

#[tracing::instrument(name = "Home listing", skip(inner))]
pub async fn home(State(inner): State<InnerState>) -> Result<Json<Vec<Video>>, AppError> {
    let InnerState { db, .. } = inner;

    let videos = fetch_videos(&db).await?;
    Ok(Json(videos))
}

#[tracing::instrument(name = "Watch latest video", skip(inner))]
pub async fn watch_latest(State(inner): State<InnerState>) -> Result<Response, AppError> {
    let InnerState { db, .. } = inner;

    match fetch_latest_video(&db).await? {
        Some(video) => {
            tracing::debug!("Redirecting to latest video {}", video.id);
            Ok(redirect_found(&format!("/watch/{}", video.id)))
        }
        None => {
            tracing::debug!("No videos yet, redirecting home");
            Ok(redirect_found("/"))
        }
    }
}

#[tracing::instrument(name = "Watch video", skip(inner), fields(video_id = %video_id))]
pub async fn watch_video(
    State(inner): State<InnerState>,
    Path(video_id): Path<i64>,
) -> Result<Json<Video>, AppError> {
    let InnerState { db, .. } = inner;

    let video = fetch_video(&db, video_id).await?;
    Ok(Json(video))
}

pub async fn about() -> Json<Value> {
    Json(json!({ "page": "about" }))
}

pub async fn donate() -> Json<Value> {
    Json(json!({ "page": "donate" }))
}

pub async fn contact_page() -> Json<Value> {
    Json(json!({ "page": "contact" }))
}
