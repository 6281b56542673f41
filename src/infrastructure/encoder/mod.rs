//! External encoder adapter.
//!
//! Each [`EncoderCommand`] maps to exactly one process invocation. Arguments are
//! handed to the process as a vector, never through a shell.

pub mod ffmpeg;

use futures_util::future::BoxFuture;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for {operation}: {source}")]
    Wait {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{operation} exited with {status}: {diagnostic}")]
    Failed {
        operation: &'static str,
        status: String,
        diagnostic: String,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },
}

impl EncoderError {
    /// The tool's own output for failed runs, otherwise the error text.
    pub fn diagnostic(&self) -> String {
        match self {
            EncoderError::Failed { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

/// Placement of the caption drawn onto the intro.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub x: String,
    pub y: String,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            x: "(w-text_w)/2".to_string(),
            y: "(h-text_h)/2+100".to_string(),
            font_size: 48,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncoderCommand {
    /// Burn the text of `caption_file` into `input`, copying audio untouched.
    Overlay {
        input: PathBuf,
        caption_file: PathBuf,
        output: PathBuf,
        style: CaptionStyle,
    },
    /// Join the segments listed in `manifest` without re-encoding.
    Concat { manifest: PathBuf, output: PathBuf },
}

impl EncoderCommand {
    pub fn overlay(input: &Path, caption_file: &Path, output: &Path) -> Self {
        EncoderCommand::Overlay {
            input: input.to_path_buf(),
            caption_file: caption_file.to_path_buf(),
            output: output.to_path_buf(),
            style: CaptionStyle::default(),
        }
    }

    pub fn concat(manifest: &Path, output: &Path) -> Self {
        EncoderCommand::Concat {
            manifest: manifest.to_path_buf(),
            output: output.to_path_buf(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            EncoderCommand::Overlay { .. } => "overlay",
            EncoderCommand::Concat { .. } => "concat",
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            EncoderCommand::Overlay { output, .. } | EncoderCommand::Concat { output, .. } => {
                output
            }
        }
    }

    /// Arguments for the ffmpeg command line, excluding the binary itself.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        match self {
            EncoderCommand::Overlay {
                input,
                caption_file,
                output,
                style,
            } => {
                args.push("-i".to_string());
                args.push(path_arg(input));
                args.push("-vf".to_string());
                args.push(drawtext_filter(caption_file, style));
                args.extend(["-c:a", "copy"].map(String::from));
                args.push(path_arg(output));
            }
            EncoderCommand::Concat { manifest, output } => {
                args.extend(["-f", "concat", "-safe", "0", "-i"].map(String::from));
                args.push(path_arg(manifest));
                args.extend(["-c", "copy"].map(String::from));
                // Output may carry a staging suffix, so the muxer is named explicitly.
                args.extend(["-f", "mp4"].map(String::from));
                args.push(path_arg(output));
            }
        }

        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn drawtext_filter(caption_file: &Path, style: &CaptionStyle) -> String {
    // The text is read from a file with expansion disabled, so nothing typed by a
    // customer is ever parsed as filter syntax or %{} expressions.
    format!(
        "drawtext=textfile={}:expansion=none:x={}:y={}:fontsize={}:fontcolor={}:box=1:boxcolor={}",
        escape_filter_value(&caption_file.to_string_lossy()),
        style.x,
        style.y,
        style.font_size,
        style.font_color,
        style.box_color,
    )
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes a value for a filter option and then for the surrounding filtergraph.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

/// Renders a concat demuxer manifest, one `file '<path>'` line per segment.
pub fn concat_manifest(segments: &[&Path]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', r"'\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Something that can run an [`EncoderCommand`] to completion.
///
/// `Ok` means the declared output exists and is authoritative. On `Err` the output
/// path must not be trusted.
pub trait Encoder: Send + Sync {
    fn invoke<'a>(&'a self, command: &'a EncoderCommand) -> BoxFuture<'a, Result<(), EncoderError>>;
}
