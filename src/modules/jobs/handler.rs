use super::dto::{JobFailure, JobSuccess};
use super::error::JobError;
use super::model::JobRequest;
use super::service::JobService;
use crate::common::response::{ApiError, ApiFailure, ApiResponse, ApiSuccess};
use crate::common::upload::{stream_to_file, UploadedFile};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

async fn drop_upload(upload: Option<UploadedFile>) {
    if let Some(upload) = upload {
        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            warn!("Failed to remove abandoned upload {}: {}", upload.path.display(), e);
        }
    }
}

/// Collects `customer_name` and streams `main_video` to disk, in whatever order
/// the client sends them.
async fn read_process_form(state: &AppState, mut multipart: Multipart) -> Result<JobRequest, ApiError> {
    let mut customer_name = String::new();
    let mut main_video: Option<UploadedFile> = None;

    let result = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break Ok(()),
            Err(e) => {
                break Err(ApiError(
                    format!("Malformed multipart request: {}", e),
                    StatusCode::BAD_REQUEST,
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "customer_name" => match field.text().await {
                Ok(text) => customer_name = text,
                Err(e) => {
                    break Err(ApiError(
                        format!("Malformed multipart request: {}", e),
                        StatusCode::BAD_REQUEST,
                    ))
                }
            },
            "main_video" if main_video.is_none() => {
                match stream_to_file(&state.storage, field).await {
                    Ok(uploaded) => main_video = Some(uploaded),
                    Err(e) => break Err(ApiError::from(e)),
                }
            }
            _ => {}
        }
    };

    if let Err(e) = result {
        drop_upload(main_video).await;
        return Err(e);
    }

    Ok(JobRequest {
        customer_name,
        main_video: main_video.map(|u| u.path),
    })
}

/// Compose intro (with customer name) + main video + outro
#[utoipa::path(
    post,
    path = "/process-video",
    request_body(content = String, content_type = "multipart/form-data", description = "Fields: customer_name (text), main_video (file)"),
    responses(
        (status = 200, description = "Video processed", body = ApiResponse<JobSuccess>),
        (status = 400, description = "Missing input or templates"),
        (status = 500, description = "Encoding failed", body = ApiResponse<JobFailure>)
    ),
    tag = "Jobs"
)]
pub async fn process_video(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let request = match read_process_form(&state, multipart).await {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match JobService::process(&state, request).await {
        Ok(job) => {
            info!("Job {} produced {}", job.job_id, job.output_reference);
            ApiSuccess(
                ApiResponse::success(job, "Video processed successfully"),
                StatusCode::OK,
            )
            .into_response()
        }
        Err(e @ JobError::Validation { .. }) => ApiError(e.to_string(), e.status_code()).into_response(),
        Err(e) => ApiFailure(
            ApiResponse::failure(JobFailure::from(&e), "Video processing failed"),
            e.status_code(),
        )
        .into_response(),
    }
}
