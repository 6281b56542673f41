use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::modules::templates::handler::template_status,
        crate::modules::templates::handler::upload_template,
        crate::modules::jobs::handler::process_video,
        crate::modules::artifacts::handler::list_videos,
        crate::modules::artifacts::handler::download_video,
        crate::modules::artifacts::handler::stream_output,
    ),
    components(
        schemas(
            crate::routes::HealthResponse,
            crate::modules::templates::model::TemplateRole,
            crate::modules::templates::dto::TemplateStatusResponse,
            crate::modules::templates::dto::TemplateUploadResponse,
            crate::modules::jobs::model::FailureKind,
            crate::modules::jobs::dto::JobSuccess,
            crate::modules::jobs::dto::JobFailure,
            crate::modules::artifacts::dto::VideoListResponse,
        )
    ),
    tags(
        (name = "System", description = "Health"),
        (name = "Templates", description = "Intro and outro template management"),
        (name = "Jobs", description = "Video assembly"),
        (name = "Videos", description = "Produced videos")
    )
)]
pub struct ApiDoc;
