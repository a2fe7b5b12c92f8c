//! Fast-start optimization
//!
//! Remuxes a staged video so the `moov` index sits ahead of the media data.
//! Streams are copied, never re-encoded.

use crate::mp4;
use crate::staging::{StagedAsset, StagingError, TempStagingStore};
use crate::tools::{stderr_excerpt, validate_tool_path};
use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tubely_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("Failed to run {tool}: {source}")]
    Unavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Container cannot be remuxed: {0}")]
    UnsupportedContainer(String),

    #[error("Remuxed output is not fast-start: {0}")]
    NotFastStart(String),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Optimize IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OptimizeError> for AppError {
    fn from(err: OptimizeError) -> Self {
        AppError::Optimize(err.to_string())
    }
}

/// Output container. Matches the uploaded container so `.mov` stays QuickTime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Mp4,
    Mov,
}

impl ContainerFormat {
    pub fn from_content_type(content_type: &str) -> Result<Self, OptimizeError> {
        match content_type {
            "video/mp4" => Ok(ContainerFormat::Mp4),
            "video/quicktime" => Ok(ContainerFormat::Mov),
            other => Err(OptimizeError::UnsupportedContainer(other.to_string())),
        }
    }

    /// ffmpeg muxer name
    pub fn muxer(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mov => "mov",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.muxer()
    }
}

#[async_trait]
pub trait ContainerRemuxer: Send + Sync {
    /// Write a fast-start copy of `input` to `output`. `output` already
    /// exists and may be overwritten.
    async fn remux_fast_start(
        &self,
        input: &Path,
        output: &Path,
        format: ContainerFormat,
    ) -> Result<(), OptimizeError>;
}

/// ffmpeg-backed remuxer
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: String) -> anyhow::Result<Self> {
        validate_tool_path(&ffmpeg_path).context("Invalid FFMPEG_PATH")?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl ContainerRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux_fast_start(
        &self,
        input: &Path,
        output: &Path,
        format: ContainerFormat,
    ) -> Result<(), OptimizeError> {
        let result = Command::new(&self.ffmpeg_path)
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "+faststart", "-f", format.muxer()])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OptimizeError::Unavailable {
                tool: self.ffmpeg_path.clone(),
                source: e,
            })?;

        if !result.status.success() {
            return Err(OptimizeError::Failed {
                tool: self.ffmpeg_path.clone(),
                status: result.status.to_string(),
                stderr: stderr_excerpt(&result),
            });
        }

        Ok(())
    }
}

/// Produces fast-start copies of staged videos in the staging directory.
#[derive(Clone)]
pub struct StreamOptimizer {
    remuxer: Arc<dyn ContainerRemuxer>,
    staging: TempStagingStore,
}

impl StreamOptimizer {
    pub fn new(remuxer: Arc<dyn ContainerRemuxer>, staging: TempStagingStore) -> Self {
        Self { remuxer, staging }
    }

    /// Returns a new staged asset; `source` is left untouched. On failure
    /// the partially written output is removed.
    pub async fn optimize(
        &self,
        source: &StagedAsset,
        format: ContainerFormat,
    ) -> Result<StagedAsset, OptimizeError> {
        let start = std::time::Instant::now();
        let mut output = self.staging.allocate(&format!(".{}", format.extension()))?;

        self.remuxer
            .remux_fast_start(source.path(), output.path(), format)
            .await?;

        let boxes = mp4::read_top_level_boxes(output.path())
            .await
            .map_err(|e| OptimizeError::NotFastStart(e.to_string()))?;
        if !mp4::is_fast_start(&boxes) {
            let layout: Vec<String> = boxes.iter().map(|b| b.kind_str()).collect();
            return Err(OptimizeError::NotFastStart(format!(
                "top-level boxes: [{}]",
                layout.join(", ")
            )));
        }

        let size_bytes = tokio::fs::metadata(output.path()).await?.len();
        output.set_size_bytes(size_bytes);

        tracing::info!(
            input_bytes = source.size_bytes(),
            output_bytes = size_bytes,
            container = format.muxer(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fast-start remux completed"
        );

        Ok(output)
    }
}
