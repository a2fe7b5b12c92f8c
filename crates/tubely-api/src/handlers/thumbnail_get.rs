use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::parse_video_id;
use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// Serve a thumbnail held by the in-process cache backend.
#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = Uuid, Path, description = "Video record ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes with the stored content type"),
        (status = 404, description = "No cached thumbnail", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    let thumbnail = state.thumbnails.fetch(video_id).await?;

    Ok((
        [
            (CONTENT_TYPE, thumbnail.content_type),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        thumbnail.data,
    ))
}
