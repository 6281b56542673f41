use super::dto::{TemplateStatusResponse, TemplateUploadResponse};
use super::model::TemplateRole;
use super::service::TemplateService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::stream_to_file;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info, warn};

/// Which templates are currently uploaded
#[utoipa::path(
    get,
    path = "/template-status",
    responses(
        (status = 200, description = "Template presence", body = ApiResponse<TemplateStatusResponse>)
    ),
    tag = "Templates"
)]
pub async fn template_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = TemplateService::status(&state).await;
    ApiSuccess(
        ApiResponse::success(status, "Template status retrieved"),
        StatusCode::OK,
    )
}

/// Upload (replace) the intro or outro template
#[utoipa::path(
    post,
    path = "/upload-template/{type}",
    params(
        ("type" = TemplateRole, Path, description = "intro or outro")
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "Field: video (file)"),
    responses(
        (status = 200, description = "Template stored", body = ApiResponse<TemplateUploadResponse>),
        (status = 400, description = "Invalid template type or missing file"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Templates"
)]
pub async fn upload_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let role = match kind.parse::<TemplateRole>() {
        Ok(role) => role,
        Err(_) => return ApiError("Invalid template type".to_string(), StatusCode::BAD_REQUEST).into_response(),
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiError(format!("Malformed multipart request: {}", e), StatusCode::BAD_REQUEST)
                    .into_response();
            }
        };
        let name = field.name().unwrap_or("").to_string();

        if name == "video" {
            info!("Starting {} template upload", role);

            let upload = match stream_to_file(&state.storage, field).await {
                Ok(upload) => upload,
                Err(e) => return ApiError::from(e).into_response(),
            };
            let staged = upload.path.clone();

            return match TemplateService::replace(&state, role, upload).await {
                Ok(res) => {
                    let message = format!("{} template uploaded successfully", role);
                    ApiSuccess(ApiResponse::success(res, &message), StatusCode::OK).into_response()
                }
                Err(e) => {
                    error!("Failed to store {} template: {}", role, e);
                    if let Err(e) = tokio::fs::remove_file(&staged).await {
                        warn!("Failed to remove staged template {}: {}", staged.display(), e);
                    }
                    ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
                }
            };
        }
    }

    ApiError("No video field found in multipart request".to_string(), StatusCode::BAD_REQUEST).into_response()
}
