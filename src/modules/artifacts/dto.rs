use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoListResponse {
    pub videos: Vec<String>,
}
