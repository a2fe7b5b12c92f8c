//! Request-independent pipelines behind the HTTP handlers

pub mod ingest;
pub mod thumbnail;

pub use ingest::IngestService;
pub use thumbnail::ThumbnailService;
