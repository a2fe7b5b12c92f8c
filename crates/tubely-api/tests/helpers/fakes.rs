//! Recording fakes for ffprobe, ffmpeg and the object store.

use super::fixtures;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tubely_core::StorageBackend;
use tubely_processing::{
    ContainerFormat, ContainerRemuxer, MediaAnalyzer, OptimizeError, ProbeError, StreamDimensions,
};
use tubely_storage::{Storage, StorageError, StorageResult};

/// Reports fixed dimensions, or no video stream once [`FakeAnalyzer::fail`] is called.
pub struct FakeAnalyzer {
    dimensions: Mutex<Option<StreamDimensions>>,
    delay: Mutex<Option<Duration>>,
    during_analysis: Mutex<Option<BoxFuture<'static, ()>>>,
    calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: Mutex::new(Some(StreamDimensions { width, height })),
            delay: Mutex::new(None),
            during_analysis: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Stall every analysis for `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Run `work` inside the next analysis, while the upload is in flight.
    pub fn run_during_analysis(&self, work: impl Future<Output = ()> + Send + 'static) {
        *self.during_analysis.lock().unwrap() = Some(Box::pin(work));
    }

    pub fn set_dimensions(&self, width: u32, height: u32) {
        *self.dimensions.lock().unwrap() = Some(StreamDimensions { width, height });
    }

    pub fn fail(&self) {
        *self.dimensions.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaAnalyzer for FakeAnalyzer {
    async fn dimensions(&self, path: &Path) -> Result<StreamDimensions, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "analysis must run against a staged file");

        let work = self.during_analysis.lock().unwrap().take();
        if let Some(work) = work {
            work.await;
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        (*self.dimensions.lock().unwrap()).ok_or(ProbeError::NoVideoStream)
    }
}

/// Writes a fast-start fixture instead of running ffmpeg.
pub struct FakeRemuxer {
    fail: AtomicBool,
    calls: AtomicUsize,
    formats: Mutex<Vec<ContainerFormat>>,
}

impl FakeRemuxer {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            formats: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn formats(&self) -> Vec<ContainerFormat> {
        self.formats.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRemuxer for FakeRemuxer {
    async fn remux_fast_start(
        &self,
        input: &Path,
        output: &Path,
        format: ContainerFormat,
    ) -> Result<(), OptimizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.formats.lock().unwrap().push(format);
        assert!(input.exists(), "remux input must still be staged");

        if self.fail.load(Ordering::SeqCst) {
            return Err(OptimizeError::Failed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }

        tokio::fs::write(output, fixtures::fast_start_mp4()).await?;
        Ok(())
    }
}

/// An object received by [`RecordingStorage`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub source: PathBuf,
}

/// In-memory object store with S3-style URLs and no-overwrite semantics.
pub struct RecordingStorage {
    bucket: String,
    region: String,
    fail: AtomicBool,
    objects: Mutex<Vec<StoredObject>>,
}

impl RecordingStorage {
    pub fn new(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            fail: AtomicBool::new(false),
            objects: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let data = tokio::fs::read(path).await?;

        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("connection reset".to_string()));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.iter().any(|o| o.key == key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        objects.push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
            source: path.to_path_buf(),
        });
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        tubely_storage::s3::public_object_url(&self.bucket, &self.region, None, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
