use super::model::{FailureKind, JobId};
use crate::infrastructure::encoder::EncoderError;
use crate::infrastructure::storage::artifacts::StoreError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{message}")]
    Validation { job_id: JobId, message: String },

    #[error("{source}")]
    Encoding {
        job_id: JobId,
        #[source]
        source: EncoderError,
    },

    #[error("{source}")]
    Storage {
        job_id: JobId,
        #[source]
        source: StoreError,
    },
}

impl JobError {
    pub fn validation(job_id: &JobId, message: impl Into<String>) -> Self {
        JobError::Validation {
            job_id: job_id.clone(),
            message: message.into(),
        }
    }

    pub fn encoding(job_id: &JobId, source: EncoderError) -> Self {
        JobError::Encoding {
            job_id: job_id.clone(),
            source,
        }
    }

    pub fn storage(job_id: &JobId, source: StoreError) -> Self {
        JobError::Storage {
            job_id: job_id.clone(),
            source,
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            JobError::Validation { job_id, .. }
            | JobError::Encoding { job_id, .. }
            | JobError::Storage { job_id, .. } => job_id,
        }
    }

    /// A job that could not produce its output is an encoding failure to the
    /// caller, whether the tool or the disk around it gave out.
    pub fn kind(&self) -> FailureKind {
        match self {
            JobError::Validation { .. } => FailureKind::ValidationError,
            JobError::Encoding { .. } | JobError::Storage { .. } => FailureKind::EncodingError,
        }
    }

    /// Text surfaced to the caller; for encoder failures this is the tool's own output.
    pub fn details(&self) -> String {
        match self {
            JobError::Validation { message, .. } => message.clone(),
            JobError::Encoding { source, .. } => source.diagnostic(),
            JobError::Storage { source, .. } => source.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            FailureKind::ValidationError => StatusCode::BAD_REQUEST,
            FailureKind::EncodingError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
