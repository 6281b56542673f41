use std::path::PathBuf;
use std::time::Duration;

use crate::config::env::{self, EnvKey};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ENCODER_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub uploads_dir: PathBuf,
    pub output_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub public_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub encoder_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Self {
        // APP_PORT wins; PORT is still honoured for platform-style deployments.
        let fallback_port = env::get_parsed(EnvKey::LegacyPort, DEFAULT_PORT);

        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, fallback_port),
            uploads_dir: env::get_or(EnvKey::UploadsDir, "/tmp/uploads").into(),
            output_dir: env::get_or(EnvKey::OutputDir, "/tmp/output").into(),
            templates_dir: env::get_or(EnvKey::TemplatesDir, "/tmp/templates").into(),
            public_dir: env::get_or(EnvKey::PublicDir, "public").into(),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg").into(),
            encoder_timeout: Duration::from_secs(env::get_parsed(
                EnvKey::EncoderTimeoutSecs,
                DEFAULT_ENCODER_TIMEOUT_SECS,
            )),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
