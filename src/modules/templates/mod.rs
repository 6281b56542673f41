use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

pub mod dto;
pub mod handler;
pub mod model;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/template-status", get(handler::template_status))
        .route("/upload-template/{type}", post(handler::upload_template))
}
