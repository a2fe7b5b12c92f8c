//! Top-level ISO-BMFF (MP4/MOV) box layout.
//!
//! Only box headers are read, never sample data.

use std::io::{Error, ErrorKind, Result, SeekFrom};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const MAX_TOP_LEVEL_BOXES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub kind: [u8; 4],
    pub offset: u64,
    pub size: u64,
}

impl BoxHeader {
    pub fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidData, msg.into())
}

/// Walk the top-level boxes of the file at `path`.
pub async fn read_top_level_boxes(path: &Path) -> Result<Vec<BoxHeader>> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let mut boxes = Vec::new();
    let mut offset = 0u64;

    while offset < len {
        if boxes.len() >= MAX_TOP_LEVEL_BOXES {
            return Err(invalid("too many top-level boxes"));
        }
        if len - offset < 8 {
            return Err(invalid(format!("truncated box header at offset {}", offset)));
        }

        file.seek(SeekFrom::Start(offset)).await?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header).await?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];

        let (size, header_len) = match size32 {
            0 => (len - offset, 8),
            1 => {
                if len - offset < 16 {
                    return Err(invalid(format!(
                        "truncated large box header at offset {}",
                        offset
                    )));
                }
                let mut large = [0u8; 8];
                file.read_exact(&mut large).await?;
                (u64::from_be_bytes(large), 16)
            }
            n => (u64::from(n), 8),
        };

        if size < header_len || size > len - offset {
            return Err(invalid(format!(
                "box '{}' at offset {} has invalid size {}",
                String::from_utf8_lossy(&kind),
                offset,
                size
            )));
        }

        boxes.push(BoxHeader { kind, offset, size });
        offset += size;
    }

    Ok(boxes)
}

/// True when the `moov` index precedes the first `mdat`, so playback can
/// start before the whole file has downloaded.
pub fn is_fast_start(boxes: &[BoxHeader]) -> bool {
    let moov = boxes.iter().position(|b| &b.kind == b"moov");
    let mdat = boxes.iter().position(|b| &b.kind == b"mdat");
    match (moov, mdat) {
        (Some(moov), Some(mdat)) => moov < mdat,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
