//! Drives one job from validation to a published video.
//!
//! `Validating → Overlaying → Concatenating → CleaningUp → Done`, with `Errored`
//! reachable from every non-terminal state. The two encoder calls are strictly
//! sequential; cleanup runs on every path that got past validation.

use super::dto::JobSuccess;
use super::error::JobError;
use super::model::{JobId, JobRequest, JobState};
use crate::infrastructure::encoder::{concat_manifest, Encoder, EncoderCommand};
use crate::infrastructure::storage::artifacts::{
    ArtifactStore, JobPaths, StoreError, TemplateSnapshot,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

pub struct Pipeline<'a> {
    store: &'a ArtifactStore,
    encoder: &'a dyn Encoder,
}

/// Per-run bookkeeping; only the pipeline moves it between states.
struct Run {
    job_id: JobId,
    state: JobState,
    started: Instant,
}

impl Run {
    fn enter(&mut self, next: JobState) {
        debug_assert!(!self.state.is_terminal(), "job already finished");
        info!(job_id = %self.job_id, from = %self.state, to = %next, "job state changed");
        self.state = next;
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a ArtifactStore, encoder: &'a dyn Encoder) -> Self {
        Self { store, encoder }
    }

    pub async fn run(&self, job_id: JobId, request: JobRequest) -> Result<JobSuccess, JobError> {
        let mut run = Run {
            job_id,
            state: JobState::Validating,
            started: Instant::now(),
        };
        info!(job_id = %run.job_id, customer_name = %request.customer_name, "job received");

        let paths = self.store.job_paths(&run.job_id);

        let (main_video, snapshot) = match self.validate(&run.job_id, &request, &paths).await {
            Ok(inputs) => inputs,
            Err(e) => {
                // Nothing was created yet; only the caller's upload needs to go.
                if let Some(upload) = &request.main_video {
                    self.store.discard(&run.job_id, "main video upload", upload).await;
                }
                warn!(job_id = %run.job_id, "job rejected: {}", e);
                run.enter(JobState::Errored);
                return Err(e);
            }
        };

        let outcome = self
            .assemble(&mut run, &request.customer_name, &main_video, &snapshot, &paths)
            .await;

        run.enter(JobState::CleaningUp);
        self.clean_up(&run.job_id, &main_video, &paths).await;

        match outcome {
            Ok(()) => {
                run.enter(JobState::Done);
                let output_reference = paths.final_name();
                let elapsed_ms = run.started.elapsed().as_millis() as u64;
                info!(job_id = %run.job_id, elapsed_ms, output = %output_reference, "job finished");

                Ok(JobSuccess {
                    output_url: self.store.output_url(&output_reference),
                    download_url: format!("/download/{output_reference}"),
                    job_id: run.job_id,
                    customer_name: request.customer_name,
                    output_reference,
                    elapsed_ms,
                })
            }
            Err(e) => {
                error!(job_id = %run.job_id, "job failed: {}", e);
                run.enter(JobState::Errored);
                Err(e)
            }
        }
    }

    async fn validate(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        paths: &JobPaths,
    ) -> Result<(PathBuf, TemplateSnapshot), JobError> {
        if request.customer_name.trim().is_empty() {
            return Err(JobError::validation(job_id, "customer_name is required"));
        }

        let main_video = match &request.main_video {
            Some(path) if is_non_empty_file(path).await => path.clone(),
            _ => return Err(JobError::validation(job_id, "main_video file is required")),
        };

        let snapshot = self.store.snapshot_templates(paths).await.map_err(|e| match e {
            StoreError::TemplateMissing(_) => JobError::validation(
                job_id,
                "Template files not found. Please upload intro and outro videos first.",
            ),
            other => JobError::storage(job_id, other),
        })?;

        Ok((main_video, snapshot))
    }

    async fn assemble(
        &self,
        run: &mut Run,
        customer_name: &str,
        main_video: &Path,
        snapshot: &TemplateSnapshot,
        paths: &JobPaths,
    ) -> Result<(), JobError> {
        let job_id = run.job_id.clone();

        run.enter(JobState::Overlaying);
        write_scratch(&paths.caption, customer_name, "writing caption")
            .await
            .map_err(|e| JobError::storage(&job_id, e))?;
        let overlay = EncoderCommand::overlay(&snapshot.intro, &paths.caption, &paths.intermediate);
        self.encoder
            .invoke(&overlay)
            .await
            .map_err(|e| JobError::encoding(&job_id, e))?;

        run.enter(JobState::Concatenating);
        let manifest = concat_manifest(&[
            paths.intermediate.as_path(),
            main_video,
            snapshot.outro.as_path(),
        ]);
        write_scratch(&paths.manifest, &manifest, "writing concat manifest")
            .await
            .map_err(|e| JobError::storage(&job_id, e))?;
        let concat = EncoderCommand::concat(&paths.manifest, &paths.staged_output);
        self.encoder
            .invoke(&concat)
            .await
            .map_err(|e| JobError::encoding(&job_id, e))?;

        self.store
            .publish_final(paths)
            .await
            .map_err(|e| JobError::storage(&job_id, e))
    }

    async fn clean_up(&self, job_id: &JobId, main_video: &Path, paths: &JobPaths) {
        self.store.discard(job_id, "main video upload", main_video).await;
        for (what, path) in paths.scratch() {
            self.store.discard(job_id, what, path).await;
        }
    }
}

async fn is_non_empty_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

async fn write_scratch(path: &Path, contents: &str, operation: &'static str) -> Result<(), StoreError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| StoreError::Io { operation, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::encoder::EncoderError;
    use crate::modules::jobs::model::{FailureKind, JobIdAllocator};
    use crate::modules::templates::model::TemplateRole;
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every command and the manifest it saw; writes the declared output
    /// unless told to fail that operation.
    #[derive(Default)]
    struct RecordingEncoder {
        fail_on: Option<&'static str>,
        calls: Mutex<Vec<EncoderCommand>>,
        manifests: Mutex<Vec<String>>,
    }

    impl RecordingEncoder {
        fn failing_on(operation: &'static str) -> Self {
            Self {
                fail_on: Some(operation),
                ..Self::default()
            }
        }

        fn operations(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().iter().map(|c| c.operation()).collect()
        }
    }

    impl Encoder for RecordingEncoder {
        fn invoke<'a>(&'a self, command: &'a EncoderCommand) -> BoxFuture<'a, Result<(), EncoderError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(command.clone());
                if let EncoderCommand::Concat { manifest, .. } = command {
                    let text = tokio::fs::read_to_string(manifest).await.unwrap();
                    self.manifests.lock().unwrap().push(text);
                }

                // A failing tool may still leave a partial file behind.
                tokio::fs::write(command.output(), b"encoded").await.unwrap();

                if self.fail_on == Some(command.operation()) {
                    return Err(EncoderError::Failed {
                        operation: command.operation(),
                        status: "exit status: 1".to_string(),
                        diagnostic: format!("{} blew up", command.operation()),
                    });
                }
                Ok(())
            })
        }
    }

    struct Fixture {
        _root: TempDir,
        store: ArtifactStore,
    }

    impl Fixture {
        async fn new() -> Self {
            let root = TempDir::new().unwrap();
            let store = ArtifactStore::new(
                &root.path().join("uploads"),
                &root.path().join("output"),
                &root.path().join("templates"),
            );
            store.ensure_directories().await.unwrap();
            Self { _root: root, store }
        }

        async fn with_templates() -> Self {
            let fixture = Self::new().await;
            for role in TemplateRole::ALL {
                let staged = fixture.upload(role.as_str()).await;
                fixture.store.store_template(role, &staged).await.unwrap();
            }
            fixture
        }

        async fn upload(&self, body: &str) -> PathBuf {
            let path = self.store.allocate_upload_path("main.mp4");
            tokio::fs::write(&path, body).await.unwrap();
            path
        }

        async fn request(&self, name: &str) -> JobRequest {
            JobRequest {
                customer_name: name.to_string(),
                main_video: Some(self.upload("main").await),
            }
        }

        fn files_in(&self, dir: &Path) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }

        fn outputs(&self) -> Vec<String> {
            self.files_in(self.store.output_dir())
        }

        fn uploads(&self) -> Vec<String> {
            self.files_in(self.store.uploads_dir())
        }
    }

    #[tokio::test]
    async fn successful_job_publishes_one_video_and_cleans_up() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);
        let request = fixture.request("Jane Doe").await;
        let main_video = request.main_video.clone().unwrap();

        let success = pipeline
            .run(JobId::from_millis(1700000000123), request)
            .await
            .unwrap();

        assert_eq!(success.job_id.as_str(), "job_1700000000123");
        assert_eq!(success.customer_name, "Jane Doe");
        assert_eq!(success.output_reference, "job_1700000000123_final.mp4");
        assert_eq!(success.output_url, "/outputs/job_1700000000123_final.mp4");
        assert_eq!(fixture.outputs(), ["job_1700000000123_final.mp4"]);
        assert!(fixture.uploads().is_empty(), "left behind: {:?}", fixture.uploads());
        assert!(!main_video.exists());
        assert_eq!(encoder.operations(), ["overlay", "concat"]);
    }

    #[tokio::test]
    async fn segments_are_concatenated_intro_main_outro() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);
        let request = fixture.request("Jane Doe").await;
        let main_video = request.main_video.clone().unwrap();
        let job_id = JobId::from_millis(5);
        let paths = fixture.store.job_paths(&job_id);

        pipeline.run(job_id, request).await.unwrap();

        let manifests = encoder.manifests.lock().unwrap();
        assert_eq!(
            manifests[0],
            concat_manifest(&[
                paths.intermediate.as_path(),
                main_video.as_path(),
                paths.outro_snapshot.as_path(),
            ])
        );
    }

    #[tokio::test]
    async fn overlay_uses_pinned_intro_and_caption_file() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);
        let job_id = JobId::from_millis(6);
        let paths = fixture.store.job_paths(&job_id);

        pipeline
            .run(job_id, fixture.request("Robert'); DROP TABLE--").await)
            .await
            .unwrap();

        let calls = encoder.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            EncoderCommand::overlay(&paths.intro_snapshot, &paths.caption, &paths.intermediate)
        );
        assert!(calls[0].to_args().iter().all(|a| !a.contains("DROP TABLE")));
    }

    #[tokio::test]
    async fn missing_template_is_a_validation_error_without_artifacts() {
        let fixture = Fixture::new().await;
        let staged = fixture.upload("intro").await;
        fixture.store.store_template(TemplateRole::Intro, &staged).await.unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);

        let err = pipeline
            .run(JobId::from_millis(1), fixture.request("Jane Doe").await)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::ValidationError);
        assert_eq!(
            err.details(),
            "Template files not found. Please upload intro and outro videos first."
        );
        assert!(encoder.operations().is_empty());
        assert!(fixture.outputs().is_empty());
        assert!(fixture.uploads().is_empty());
    }

    #[tokio::test]
    async fn blank_name_and_missing_video_are_rejected() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);

        let err = pipeline
            .run(JobId::from_millis(1), fixture.request("   ").await)
            .await
            .unwrap_err();
        assert_eq!(err.details(), "customer_name is required");

        let err = pipeline
            .run(
                JobId::from_millis(2),
                JobRequest {
                    customer_name: "Jane Doe".to_string(),
                    main_video: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.details(), "main_video file is required");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let empty = fixture.upload("").await;
        let err = pipeline
            .run(
                JobId::from_millis(3),
                JobRequest {
                    customer_name: "Jane Doe".to_string(),
                    main_video: Some(empty),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.details(), "main_video file is required");

        assert!(encoder.operations().is_empty());
        assert!(fixture.uploads().is_empty());
    }

    #[tokio::test]
    async fn overlay_failure_stops_before_concatenation() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::failing_on("overlay");
        let pipeline = Pipeline::new(&fixture.store, &encoder);

        let err = pipeline
            .run(JobId::from_millis(9), fixture.request("Jane Doe").await)
            .await
            .unwrap_err();

        assert_eq!(encoder.operations(), ["overlay"]);
        assert_eq!(err.kind(), FailureKind::EncodingError);
        assert_eq!(err.job_id().as_str(), "job_9");
        assert_eq!(err.details(), "overlay blew up");
        assert!(fixture.outputs().is_empty());
        assert!(fixture.uploads().is_empty());
    }

    #[tokio::test]
    async fn concat_failure_leaves_no_partial_output() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::failing_on("concat");
        let pipeline = Pipeline::new(&fixture.store, &encoder);

        let err = pipeline
            .run(JobId::from_millis(10), fixture.request("Jane Doe").await)
            .await
            .unwrap_err();

        assert_eq!(encoder.operations(), ["overlay", "concat"]);
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(fixture.outputs().is_empty());
        assert!(fixture.uploads().is_empty());
        assert!(fixture.store.list_final_artifacts().await.unwrap().is_empty());
    }

    /// Swaps the main upload for a non-empty directory while the overlay runs,
    /// so removing it during cleanup fails with something other than NotFound.
    struct UndeletableUpload {
        main_video: PathBuf,
    }

    impl Encoder for UndeletableUpload {
        fn invoke<'a>(&'a self, command: &'a EncoderCommand) -> BoxFuture<'a, Result<(), EncoderError>> {
            Box::pin(async move {
                if command.operation() == "overlay" {
                    tokio::fs::remove_file(&self.main_video).await.unwrap();
                    tokio::fs::create_dir(&self.main_video).await.unwrap();
                    tokio::fs::write(self.main_video.join("keep"), b"x").await.unwrap();
                }
                tokio::fs::write(command.output(), b"encoded").await.unwrap();
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn failed_cleanup_does_not_fail_the_job() {
        let fixture = Fixture::with_templates().await;
        let request = fixture.request("Jane Doe").await;
        let main_video = request.main_video.clone().unwrap();
        let encoder = UndeletableUpload {
            main_video: main_video.clone(),
        };
        let pipeline = Pipeline::new(&fixture.store, &encoder);

        let success = pipeline.run(JobId::from_millis(11), request).await.unwrap();

        assert_eq!(success.output_reference, "job_11_final.mp4");
        assert_eq!(fixture.outputs(), ["job_11_final.mp4"]);
        assert!(main_video.is_dir());
        let leftover = main_video.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(fixture.uploads(), [leftover]);
    }

    #[tokio::test]
    async fn concurrent_jobs_do_not_share_artifacts() {
        let fixture = Fixture::with_templates().await;
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(&fixture.store, &encoder);
        let ids = JobIdAllocator::new();

        let alice = fixture.request("Alice").await;
        let bob = fixture.request("Bob").await;

        let (first, second) = tokio::join!(
            pipeline.run(ids.allocate(), alice),
            pipeline.run(ids.allocate(), bob),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.job_id, second.job_id);
        assert_ne!(first.output_reference, second.output_reference);
        assert_eq!(fixture.outputs().len(), 2);
        assert!(fixture.uploads().is_empty());
    }
}
