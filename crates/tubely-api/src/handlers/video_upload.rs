use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{check_declared_length, missing_field, multipart_error, parse_video_id};
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use tubely_core::constants::VIDEO_FORM_FIELD;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video record ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 204, description = "Video stored and URL committed"),
        (status = 400, description = "Invalid ID, content type or size", body = ErrorResponse),
        (status = 401, description = "Missing credential or not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Staging, processing or storage failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StatusCode, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    check_declared_length(&headers, state.ingest.max_bytes())?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        state
            .ingest
            .ingest(user.user_id, video_id, content_type.as_deref(), field)
            .await?;
        return Ok(StatusCode::NO_CONTENT);
    }

    Err(missing_field(VIDEO_FORM_FIELD).into())
}
