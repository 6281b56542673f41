use crate::state::AppState;
use axum::routing::get;
use axum::Router;

pub mod dto;
pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos", get(handler::list_videos))
        .route("/download/{filename}", get(handler::download_video))
        .route("/outputs/{filename}", get(handler::stream_output))
}
