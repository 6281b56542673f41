use crate::modules::jobs::model::JobId;
use crate::modules::templates::model::TemplateRole;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const FINAL_ARTIFACT_EXTENSION: &str = "mp4";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found")]
    NotFound,

    #[error("{0} template has not been uploaded")]
    TemplateMissing(TemplateRole),

    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(operation: &'static str) -> impl FnOnce(io::Error) -> StoreError {
        move |source| StoreError::Io { operation, source }
    }
}

/// Every file a single job may touch. All names embed the job id.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub intro_snapshot: PathBuf,
    pub outro_snapshot: PathBuf,
    pub caption: PathBuf,
    pub intermediate: PathBuf,
    pub manifest: PathBuf,
    pub staged_output: PathBuf,
    pub final_output: PathBuf,
}

impl JobPaths {
    pub fn final_name(&self) -> String {
        file_name_of(&self.final_output)
    }

    /// Scratch files removed when a job ends, whatever its outcome.
    pub fn scratch(&self) -> [(&'static str, &Path); 6] {
        [
            ("intro snapshot", self.intro_snapshot.as_path()),
            ("outro snapshot", self.outro_snapshot.as_path()),
            ("caption", self.caption.as_path()),
            ("intermediate", self.intermediate.as_path()),
            ("concat manifest", self.manifest.as_path()),
            ("staged output", self.staged_output.as_path()),
        ]
    }
}

/// Template paths pinned for one job at validation time.
#[derive(Debug, Clone)]
pub struct TemplateSnapshot {
    pub intro: PathBuf,
    pub outro: PathBuf,
}

#[derive(Default)]
struct TemplateLocks {
    intro: RwLock<()>,
    outro: RwLock<()>,
}

impl TemplateLocks {
    fn for_role(&self, role: TemplateRole) -> &RwLock<()> {
        match role {
            TemplateRole::Intro => &self.intro,
            TemplateRole::Outro => &self.outro,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn absolute(dir: &Path) -> PathBuf {
    // The concat demuxer resolves manifest entries relative to the manifest itself.
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload.mp4".to_string()
    } else {
        cleaned
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.starts_with('.')
        && !name.contains('\\')
}

fn is_final_artifact_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext == FINAL_ARTIFACT_EXTENSION)
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Filesystem-backed home of templates, uploads and produced videos.
#[derive(Clone)]
pub struct ArtifactStore {
    uploads_dir: PathBuf,
    output_dir: PathBuf,
    templates_dir: PathBuf,
    locks: Arc<TemplateLocks>,
}

impl ArtifactStore {
    pub fn new(uploads_dir: &Path, output_dir: &Path, templates_dir: &Path) -> Self {
        Self {
            uploads_dir: absolute(uploads_dir),
            output_dir: absolute(output_dir),
            templates_dir: absolute(templates_dir),
            locks: Arc::new(TemplateLocks::default()),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    pub async fn ensure_directories(&self) -> io::Result<()> {
        for dir in [&self.uploads_dir, &self.output_dir, &self.templates_dir] {
            tokio::fs::create_dir_all(dir).await?;
            debug!("Directory ready: {}", dir.display());
        }
        Ok(())
    }

    // --- TEMPLATES ---

    pub fn template_path(&self, role: TemplateRole) -> PathBuf {
        self.templates_dir.join(role.file_name())
    }

    pub async fn template_exists(&self, role: TemplateRole) -> bool {
        let _guard = self.locks.for_role(role).read().await;
        is_file(&self.template_path(role)).await
    }

    /// Moves a finished upload into the role's slot, replacing what was there.
    ///
    /// Writers for the same role are serialised and the swap is a rename, so a
    /// reader never observes a half-written template.
    pub async fn store_template(
        &self,
        role: TemplateRole,
        staged: &Path,
    ) -> Result<PathBuf, StoreError> {
        let target = self.template_path(role);
        let _guard = self.locks.for_role(role).write().await;

        if tokio::fs::rename(staged, &target).await.is_err() {
            // Uploads and templates may sit on different filesystems.
            let temp = self.templates_dir.join(format!(".{}.incoming", role.file_name()));
            tokio::fs::copy(staged, &temp)
                .await
                .map_err(StoreError::io("copying template"))?;
            tokio::fs::rename(&temp, &target)
                .await
                .map_err(StoreError::io("installing template"))?;
            if let Err(e) = tokio::fs::remove_file(staged).await {
                warn!("Failed to remove staged template {}: {}", staged.display(), e);
            }
        }

        info!("Stored {} template at {}", role, target.display());
        Ok(target)
    }

    /// Pins both templates for a job by hard-linking them into the job's scratch
    /// names. A later template upload replaces the slot, not these links.
    ///
    /// Nothing is created unless both templates exist.
    pub async fn snapshot_templates(&self, paths: &JobPaths) -> Result<TemplateSnapshot, StoreError> {
        let _intro = self.locks.intro.read().await;
        let _outro = self.locks.outro.read().await;

        for role in TemplateRole::ALL {
            if !is_file(&self.template_path(role)).await {
                return Err(StoreError::TemplateMissing(role));
            }
        }

        pin_file(&self.template_path(TemplateRole::Intro), &paths.intro_snapshot).await?;
        if let Err(e) = pin_file(&self.template_path(TemplateRole::Outro), &paths.outro_snapshot).await {
            let _ = tokio::fs::remove_file(&paths.intro_snapshot).await;
            return Err(e);
        }

        Ok(TemplateSnapshot {
            intro: paths.intro_snapshot.clone(),
            outro: paths.outro_snapshot.clone(),
        })
    }

    // --- JOB ARTIFACTS ---

    pub fn job_paths(&self, job_id: &JobId) -> JobPaths {
        let work = |suffix: &str| self.uploads_dir.join(format!("{job_id}_{suffix}"));
        let final_output = self
            .output_dir
            .join(format!("{job_id}_final.{FINAL_ARTIFACT_EXTENSION}"));

        JobPaths {
            intro_snapshot: work("intro_template.mp4"),
            outro_snapshot: work("outro_template.mp4"),
            caption: work("caption.txt"),
            intermediate: work("intro_with_name.mp4"),
            manifest: work("concat.txt"),
            staged_output: final_output.with_extension(format!("{FINAL_ARTIFACT_EXTENSION}.part")),
            final_output,
        }
    }

    pub fn allocate_upload_path(&self, original_name: &str) -> PathBuf {
        let unique = uuid::Uuid::new_v4().simple().to_string();
        self.uploads_dir
            .join(format!("{}-{}", &unique[..12], sanitize_file_name(original_name)))
    }

    /// Makes a fully written output visible under its final name.
    pub async fn publish_final(&self, paths: &JobPaths) -> Result<(), StoreError> {
        tokio::fs::rename(&paths.staged_output, &paths.final_output)
            .await
            .map_err(StoreError::io("publishing final video"))
    }

    /// Best-effort delete; failures are reported and swallowed.
    pub async fn discard(&self, job_id: &JobId, what: &str, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(job_id = %job_id, "Removed {} {}", what, path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                job_id = %job_id,
                "Cleanup warning: could not remove {} {}: {}",
                what,
                path.display(),
                e
            ),
        }
    }

    // --- FINAL ARTIFACTS ---

    pub async fn list_final_artifacts(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.output_dir)
            .await
            .map_err(StoreError::io("listing outputs"))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StoreError::io("listing outputs"))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_final_artifact_name(&name) && is_file(&entry.path()).await {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Resolves a client-supplied name to a produced video, refusing anything that
    /// is not a plain file name inside the output directory.
    pub async fn locate_final_artifact(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !is_plain_file_name(name) || !is_final_artifact_name(name) {
            return Err(StoreError::NotFound);
        }

        let path = self.output_dir.join(name);
        if is_file(&path).await {
            Ok(path)
        } else {
            Err(StoreError::NotFound)
        }
    }

    pub fn output_url(&self, name: &str) -> String {
        format!("/outputs/{name}")
    }
}

async fn pin_file(source: &Path, link: &Path) -> Result<(), StoreError> {
    if tokio::fs::hard_link(source, link).await.is_ok() {
        return Ok(());
    }

    tokio::fs::copy(source, link)
        .await
        .map(|_| ())
        .map_err(StoreError::io("snapshotting template"))
}
