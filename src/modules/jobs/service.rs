use super::dto::JobSuccess;
use super::error::JobError;
use super::model::JobRequest;
use super::pipeline::Pipeline;
use crate::state::AppState;

pub struct JobService;

impl JobService {
    /// Allocates a job id and runs the pipeline on the calling task.
    pub async fn process(state: &AppState, request: JobRequest) -> Result<JobSuccess, JobError> {
        let job_id = state.job_ids.allocate();
        let pipeline = Pipeline::new(&state.storage, state.encoder.as_ref());
        pipeline.run(job_id, request).await
    }
}
