//! Shared key generation for storage backends.
//!
//! Key format: `{classification}/{token}.{ext}`, where the token is
//! `KEY_TOKEN_BYTES` random bytes encoded as unpadded base64url.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tubely_core::constants::KEY_TOKEN_BYTES;
use tubely_core::AspectClassification;

/// Random, URL-safe token. 256 bits, so collisions are not retried.
pub fn random_token() -> String {
    let mut bytes = [0u8; KEY_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// File extension for a normalized MIME type.
pub fn extension_for_content_type(content_type: &str) -> String {
    match content_type {
        "video/mp4" => "mp4".to_string(),
        "video/quicktime" => "mov".to_string(),
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        other => other
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or(other)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase(),
    }
}

/// Key of an uploaded video in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObjectKey(String);

impl RemoteObjectKey {
    /// Fresh key with a random token.
    pub fn generate(classification: AspectClassification, content_type: &str) -> Self {
        Self::compose(
            classification,
            &random_token(),
            &extension_for_content_type(content_type),
        )
    }

    pub fn compose(classification: AspectClassification, token: &str, extension: &str) -> Self {
        RemoteObjectKey(format!("{}/{}.{}", classification.as_str(), token, extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RemoteObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
