use super::dto::VideoListResponse;
use super::service::ArtifactService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::infrastructure::storage::artifacts::StoreError;
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// List produced videos
#[utoipa::path(
    get,
    path = "/videos",
    responses(
        (status = 200, description = "Produced videos", body = ApiResponse<VideoListResponse>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn list_videos(State(state): State<AppState>) -> impl IntoResponse {
    match ArtifactService::list(&state).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Videos retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// Resolves `filename` to a published video and streams it, honouring Range.
async fn serve_artifact(state: &AppState, filename: &str, request: Request) -> Result<Response, Response> {
    let path = match ArtifactService::locate(state, filename).await {
        Ok(path) => path,
        Err(StoreError::NotFound) => {
            return Err(ApiError("File not found".to_string(), StatusCode::NOT_FOUND).into_response());
        }
        Err(e) => {
            tracing::error!("Failed to resolve {}: {}", filename, e);
            return Err(ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response());
        }
    };

    match ServeFile::new(path).oneshot(request).await {
        Ok(res) => Ok(res.into_response()),
        Err(e) => {
            tracing::error!("ServeFile error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Download a produced video
/// Served as an attachment, with Range support
#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(
        ("filename" = String, Path, description = "Name as returned by /videos")
    ),
    responses(
        (status = 200, description = "Video bytes"),
        (status = 206, description = "Partial Content"),
        (status = 404, description = "File not found")
    ),
    tag = "Videos"
)]
pub async fn download_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Response {
    let mut response = match serve_artifact(&state, &filename, request).await {
        Ok(response) => response,
        Err(response) => return response,
    };

    // Produced names are ASCII; anything else is served without a suggested name.
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

/// Play a produced video inline
#[utoipa::path(
    get,
    path = "/outputs/{filename}",
    params(
        ("filename" = String, Path, description = "Name as returned by /videos")
    ),
    responses(
        (status = 200, description = "Video bytes"),
        (status = 206, description = "Partial Content"),
        (status = 404, description = "File not found")
    ),
    tag = "Videos"
)]
pub async fn stream_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Response {
    match serve_artifact(&state, &filename, request).await {
        Ok(response) | Err(response) => response,
    }
}
