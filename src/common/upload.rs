use crate::common::response::ApiError;
use crate::infrastructure::storage::artifacts::ArtifactStore;
use axum::{body::Bytes, extract::multipart::Field, http::StatusCode};
use futures_util::StreamExt;
use mime::Mime;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid content type: only video files are accepted")]
    InvalidContentType,

    #[error("Upload stream interrupted: {0}")]
    Stream(String),

    #[error("Failed to store upload: {0}")]
    Io(#[from] io::Error),
}

impl UploadError {
    /// Client-side problems (bad type, broken stream) as opposed to disk failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        ApiError(e.to_string(), status)
    }
}

/// A multipart file that has fully landed on disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub size: u64,
}

/// Streams chunks straight into a file, removing it again if the upload is abandoned.
pub struct FileUploader {
    path: PathBuf,
    file: File,
    written: u64,
}

impl FileUploader {
    pub async fn new(path: PathBuf) -> Result<Self, UploadError> {
        let file = File::create(&path).await?;

        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), UploadError> {
        self.file.write_all(&chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self, original_name: String) -> Result<UploadedFile, UploadError> {
        self.file.flush().await?;
        self.file.sync_all().await?;

        Ok(UploadedFile {
            path: self.path,
            original_name,
            size: self.written,
        })
    }

    pub async fn abort(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!("Failed to remove partial upload {}: {}", self.path.display(), e);
        }
    }
}

fn guessed_as_video(file_name: &str) -> bool {
    // Unknown extensions are let through; ffmpeg is the final judge.
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.type_() == mime::VIDEO)
        .unwrap_or(true)
}

pub fn is_acceptable_video(content_type: Option<&str>, file_name: &str) -> bool {
    match content_type.and_then(|ct| ct.parse::<Mime>().ok()) {
        Some(m) if m.type_() == mime::VIDEO => true,
        Some(m) if m == mime::APPLICATION_OCTET_STREAM => guessed_as_video(file_name),
        Some(_) => false,
        None => guessed_as_video(file_name),
    }
}

pub async fn stream_to_file(
    store: &ArtifactStore,
    mut field: Field<'_>,
) -> Result<UploadedFile, UploadError> {
    let original_name = field.file_name().unwrap_or("video.mp4").to_string();

    if !is_acceptable_video(field.content_type(), &original_name) {
        return Err(UploadError::InvalidContentType);
    }

    let path = store.allocate_upload_path(&original_name);
    let mut uploader = FileUploader::new(path).await?;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                error!("Stream error: {}", e);
                uploader.abort().await;
                return Err(UploadError::Stream(e.to_string()));
            }
        };

        if let Err(e) = uploader.write_chunk(chunk).await {
            error!("Upload error: {}", e);
            uploader.abort().await;
            return Err(e);
        }
    }

    let uploaded = uploader.finish(original_name).await?;
    info!(
        "Stored upload {} ({} bytes) at {}",
        uploaded.original_name,
        uploaded.size,
        uploaded.path.display()
    );
    Ok(uploaded)
}
