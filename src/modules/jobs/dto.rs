use super::error::JobError;
use super::model::{FailureKind, JobId};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSuccess {
    #[schema(value_type = String, example = "job_1700000000123")]
    pub job_id: JobId,
    pub customer_name: String,
    /// File name of the produced video, e.g. `job_1700000000123_final.mp4`.
    pub output_reference: String,
    pub output_url: String,
    pub download_url: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
    #[schema(value_type = String)]
    pub job_id: JobId,
}

impl From<&JobError> for JobFailure {
    fn from(err: &JobError) -> Self {
        Self {
            kind: err.kind(),
            message: err.details(),
            job_id: err.job_id().clone(),
        }
    }
}
