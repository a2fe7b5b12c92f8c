//! Video probing - dimensions and aspect classification

use crate::tools::{stderr_excerpt, validate_tool_path};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tubely_core::{AppError, AspectClassification};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
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

    #[error("Malformed probe output: {0}")]
    MalformedOutput(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Invalid video dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

impl From<ProbeError> for AppError {
    fn from(err: ProbeError) -> Self {
        AppError::Probe(err.to_string())
    }
}

/// Display size of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDimensions {
    pub width: u32,
    pub height: u32,
}

/// External media analysis. Production uses ffprobe.
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<StreamDimensions, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<serde_json::Value>,
}

impl FfprobeStream {
    /// Rotation in degrees from the display matrix, or the legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        let from_side_data = self.side_data_list.iter().find_map(|sd| match &sd.rotation {
            Some(serde_json::Value::Number(n)) => n.as_f64().map(|r| r.round() as i64),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        });
        from_side_data
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<i64>().ok())
            })
            .unwrap_or(0)
    }
}

/// Extract display dimensions from `ffprobe -print_format json -show_streams`.
///
/// Streams rotated by a quarter turn have width and height swapped so a
/// phone video shot upright classifies as portrait.
pub fn parse_ffprobe_output(stdout: &[u8]) -> Result<StreamDimensions, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProbeError::MalformedOutput(e.to_string()))?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().unwrap_or("video") == "video")
        .ok_or(ProbeError::NoVideoStream)?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(ProbeError::MalformedOutput(
                "video stream has no width/height".to_string(),
            ))
        }
    };
    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidDimensions { width, height });
    }

    if stream.rotation().rem_euclid(180) == 90 {
        Ok(StreamDimensions {
            width: height,
            height: width,
        })
    } else {
        Ok(StreamDimensions { width, height })
    }
}

/// ffprobe-backed analyzer
pub struct FfprobeAnalyzer {
    ffprobe_path: String,
}

impl FfprobeAnalyzer {
    pub fn new(ffprobe_path: String) -> anyhow::Result<Self> {
        validate_tool_path(&ffprobe_path).context("Invalid FFPROBE_PATH")?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaAnalyzer for FfprobeAnalyzer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn dimensions(&self, path: &Path) -> Result<StreamDimensions, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Unavailable {
                tool: self.ffprobe_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                tool: self.ffprobe_path.clone(),
                status: output.status.to_string(),
                stderr: stderr_excerpt(&output),
            });
        }

        parse_ffprobe_output(&output.stdout)
    }
}

/// Classifies staged videos by aspect ratio.
#[derive(Clone)]
pub struct MediaProber {
    analyzer: Arc<dyn MediaAnalyzer>,
    tolerance_pct: u32,
}

impl MediaProber {
    pub fn new(analyzer: Arc<dyn MediaAnalyzer>, tolerance_pct: u32) -> Self {
        Self {
            analyzer,
            tolerance_pct,
        }
    }

    pub async fn probe(&self, path: &Path) -> Result<AspectClassification, ProbeError> {
        let start = std::time::Instant::now();
        let dims = self.analyzer.dimensions(path).await?;
        if dims.width == 0 || dims.height == 0 {
            return Err(ProbeError::InvalidDimensions {
                width: dims.width,
                height: dims.height,
            });
        }

        let classification =
            AspectClassification::classify(dims.width, dims.height, self.tolerance_pct);

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = dims.width,
            height = dims.height,
            classification = %classification,
            "Video probe completed"
        );

        Ok(classification)
    }
}
