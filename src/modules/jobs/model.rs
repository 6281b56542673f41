use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use utoipa::ToSchema;

const JOB_ID_PREFIX: &str = "job_";

/// `job_<millis>`; every per-job artifact name embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn from_millis(millis: u64) -> Self {
        Self(format!("{JOB_ID_PREFIX}{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn now_millis() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

/// Hands out timestamp-derived job ids that are strictly increasing within the
/// process, so two jobs started in the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct JobIdAllocator {
    last: AtomicU64,
}

impl JobIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> JobId {
        self.allocate_at(now_millis())
    }

    fn allocate_at(&self, now: u64) -> JobId {
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        JobId::from_millis(now.max(previous + 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Validating,
    Overlaying,
    Concatenating,
    CleaningUp,
    Done,
    Errored,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Validating => "validating",
            JobState::Overlaying => "overlaying",
            JobState::Concatenating => "concatenating",
            JobState::CleaningUp => "cleaning_up",
            JobState::Done => "done",
            JobState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Errored)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum FailureKind {
    ValidationError,
    EncodingError,
}

/// What a caller hands to the pipeline once uploads have landed.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub customer_name: String,
    pub main_video: Option<PathBuf>,
}
