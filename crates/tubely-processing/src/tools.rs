//! Helpers for invoking external media tools.

use anyhow::{anyhow, Result};
use std::process::Output;

/// Longest stderr excerpt kept in error messages.
const STDERR_EXCERPT_BYTES: usize = 2048;

/// Reject tool paths that look like shell fragments.
pub fn validate_tool_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(anyhow!("Tool path is empty"));
    }

    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Tool path contains dangerous characters: {}", path));
    }

    if !path.chars().all(|c| {
        c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\' || c == ':'
    }) {
        return Err(anyhow!("Tool path contains unsafe characters: {}", path));
    }

    Ok(())
}

/// Tail of a process's stderr, trimmed to a loggable size.
pub fn stderr_excerpt(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_EXCERPT_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_EXCERPT_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &trimmed[start..])
}
