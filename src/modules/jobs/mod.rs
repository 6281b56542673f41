use crate::state::AppState;
use axum::routing::post;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod pipeline;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().route("/process-video", post(handler::process_video))
}
