use super::dto::VideoListResponse;
use crate::infrastructure::storage::artifacts::StoreError;
use crate::state::AppState;
use std::path::PathBuf;

pub struct ArtifactService;

impl ArtifactService {
    pub async fn list(state: &AppState) -> Result<VideoListResponse, StoreError> {
        let videos = state.storage.list_final_artifacts().await?;
        Ok(VideoListResponse { videos })
    }

    pub async fn locate(state: &AppState, name: &str) -> Result<PathBuf, StoreError> {
        state.storage.locate_final_artifact(name).await
    }
}
