use crate::docs::ApiDoc;
use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub fn configure_routes(state: AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes())
        .merge(crate::modules::templates::router())
        .merge(crate::modules::jobs::router())
        .merge(crate::modules::artifacts::router())
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(cors)
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
    })
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
