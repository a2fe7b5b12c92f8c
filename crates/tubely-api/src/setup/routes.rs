//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::error::HttpAppError;
use crate::handlers::{
    health::{liveness_check, readiness_check},
    thumbnail_get::get_thumbnail,
    thumbnail_upload::upload_thumbnail,
    video_upload::upload_video,
    videos::{create_video, get_video, list_videos},
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tubely_core::constants::MULTIPART_OVERHEAD_BYTES;
use tubely_core::{AppError, Config, StorageBackend, ThumbnailBackend};
use tubely_infra::request_id_middleware;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let protected_routes = protected_routes().route_layer(axum::middleware::from_fn_with_state(
        state.credentials.clone(),
        auth_middleware,
    ));

    let mut app = public_routes().merge(protected_routes);

    if config.thumbnail_backend() == ThumbnailBackend::Disk {
        app = app.nest_service("/assets", ServeDir::new(config.assets_root()));
    }
    if config.storage_backend() == StorageBackend::Local {
        if let Some(path) = config.local_storage_path() {
            app = app.nest_service("/media", ServeDir::new(path));
        }
    }

    // Handlers enforce the per-kind ceilings; this is the outer bound for every route.
    let body_limit = config
        .max_video_size_bytes()
        .max(config.max_thumbnail_size_bytes())
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    tracing::info!(
        body_limit_bytes = body_limit,
        upload_timeout_secs = config.upload_timeout_secs(),
        http_concurrency_limit = http_concurrency_limit,
        "HTTP limits configured"
    );

    let app = app
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(axum::middleware::map_response(reject_oversized_body))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.upload_timeout_secs(),
        )))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .route("/api/thumbnails/{video_id}", get(get_thumbnail))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}

/// Protected routes (require a bearer token)
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/videos", post(create_video).get(list_videos))
        .route("/api/videos/{video_id}", get(get_video))
        .route("/api/video_upload/{video_id}", post(upload_video))
        .route("/api/thumbnail_upload/{video_id}", post(upload_thumbnail))
}

/// Oversized bodies are client errors like any other invalid upload, so the
/// body limit's 413 is answered in the standard error format as a 400.
async fn reject_oversized_body(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return HttpAppError(AppError::PayloadTooLarge(
            "Request body exceeds the upload limit".to_string(),
        ))
        .into_response();
    }
    response
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
