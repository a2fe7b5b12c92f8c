//! Constants shared across crates.

/// Multipart field carrying the video body.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart field carrying the thumbnail body.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Slack allowed above a file ceiling for multipart boundaries and part headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Random bytes in a remote object key token (base64url encoded to 43 chars).
pub const KEY_TOKEN_BYTES: usize = 32;

/// File name prefix for staged uploads.
pub const STAGING_FILE_PREFIX: &str = "tubely-";

/// Issuer expected in access tokens unless overridden.
pub const DEFAULT_JWT_ISSUER: &str = "tubely-access";
