//! Tubely Processing Library
//!
//! Local stages of video ingestion:
//!
//! - [`TempStagingStore`] writes an upload body to a private scratch file and
//!   hands back a [`StagedAsset`] that deletes the file when released or dropped.
//! - [`MediaProber`] asks a [`MediaAnalyzer`] (ffprobe in production) for the
//!   video dimensions and buckets them into an `AspectClassification`.
//! - [`StreamOptimizer`] asks a [`ContainerRemuxer`] (ffmpeg in production) to
//!   move the `moov` index in front of the media data, then checks the result.
//!
//! External tools sit behind traits so tests can swap in fakes.

pub mod mp4;
pub mod optimize;
pub mod probe;
pub mod staging;
pub mod tools;
pub mod validator;

pub use optimize::{ContainerFormat, ContainerRemuxer, FfmpegRemuxer, OptimizeError, StreamOptimizer};
pub use probe::{FfprobeAnalyzer, MediaAnalyzer, MediaProber, ProbeError, StreamDimensions};
pub use staging::{StagedAsset, StagingError, TempStagingStore};
pub use validator::{normalize_mime_type, ContentTypeValidator, ValidationError};
