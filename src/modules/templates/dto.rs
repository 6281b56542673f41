use super::model::TemplateRole;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateStatusResponse {
    pub intro: bool,
    pub outro: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateUploadResponse {
    pub template: TemplateRole,
    pub path: String,
}
