use crate::config::settings::AppConfig;
use crate::infrastructure::encoder::Encoder;
use crate::infrastructure::storage::artifacts::ArtifactStore;
use crate::modules::jobs::model::JobIdAllocator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: ArtifactStore,
    pub encoder: Arc<dyn Encoder>,
    pub job_ids: Arc<JobIdAllocator>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: ArtifactStore, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            config,
            storage,
            encoder,
            job_ids: Arc::new(JobIdAllocator::new()),
        }
    }
}
