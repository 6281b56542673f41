use super::dto::{TemplateStatusResponse, TemplateUploadResponse};
use super::model::TemplateRole;
use crate::common::upload::UploadedFile;
use crate::infrastructure::storage::artifacts::StoreError;
use crate::state::AppState;

pub struct TemplateService;

impl TemplateService {
    pub async fn status(state: &AppState) -> TemplateStatusResponse {
        TemplateStatusResponse {
            intro: state.storage.template_exists(TemplateRole::Intro).await,
            outro: state.storage.template_exists(TemplateRole::Outro).await,
        }
    }

    pub async fn replace(
        state: &AppState,
        role: TemplateRole,
        upload: UploadedFile,
    ) -> Result<TemplateUploadResponse, StoreError> {
        let path = state.storage.store_template(role, &upload.path).await?;

        Ok(TemplateUploadResponse {
            template: role,
            path: path.display().to_string(),
        })
    }
}
