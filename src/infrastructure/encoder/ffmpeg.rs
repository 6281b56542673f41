use super::{Encoder, EncoderCommand, EncoderError};
use futures_util::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Runs [`EncoderCommand`]s through an ffmpeg binary, one child process per call.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn binary_name(&self) -> String {
        self.binary.to_string_lossy().into_owned()
    }

    /// First line of `ffmpeg -version`, used as a startup availability check.
    pub async fn version(&self) -> Result<String, EncoderError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| EncoderError::Spawn {
                binary: self.binary_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(EncoderError::Failed {
                operation: "version check",
                status: output.status.to_string(),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    }

    async fn run(&self, command: &EncoderCommand) -> Result<(), EncoderError> {
        let operation = command.operation();
        let args = command.to_args();
        debug!(operation, binary = %self.binary.display(), ?args, "spawning encoder");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                binary: self.binary_name(),
                source,
            })?;

        // Dropping the wait future on expiry drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| EncoderError::Wait { operation, source })?,
            Err(_) => {
                error!(operation, timeout_secs = self.timeout.as_secs(), "encoder timed out");
                return Err(EncoderError::TimedOut {
                    operation,
                    after: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(operation, status = %output.status, "encoder failed: {}", diagnostic);
            return Err(EncoderError::Failed {
                operation,
                status: output.status.to_string(),
                diagnostic,
            });
        }

        info!(operation, output = %command.output().display(), "encoder finished");
        Ok(())
    }
}

impl Encoder for FfmpegEncoder {
    fn invoke<'a>(&'a self, command: &'a EncoderCommand) -> BoxFuture<'a, Result<(), EncoderError>> {
        Box::pin(self.run(command))
    }
}
