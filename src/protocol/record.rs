//! Record header layout and padding arithmetic
//!
//! Each record is a 16 byte header, the payload, then padding:
//!
//! | Offset | Size | Content                       |
//! |--------|------|-------------------------------|
//! | 0      | 1    | `'!'`                         |
//! | 1      | 5    | `'_'` x 5                     |
//! | 6      | 1    | window id                     |
//! | 7      | 1    | `'_'`                         |
//! | 8      | 4    | payload length, u32 LE        |
//! | 12     | 4    | `'_'` x 4                     |
//!
//! The framing has no resynchronization point. A single bad marker byte means
//! the reader has lost its place in the stream and must stop.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{PAD_ALIGN, RECORD_HEADER_LEN};
use crate::{PanelcastError, Result};

const START: u8 = b'!';
const FILL: u8 = b'_';

/// Number of padding bytes following a payload of `length` bytes.
///
/// Always in `1..=1024`: a payload that is already a multiple of 1024 is still
/// followed by a full 1024 bytes. Hosts in the field pad this way, so the
/// arithmetic must not be "fixed" to return zero.
pub fn padding_len(length: u32) -> u32 {
    PAD_ALIGN - (length % PAD_ALIGN)
}

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Index of the window this record belongs to
    pub window_id: u8,
    /// Payload length in bytes
    pub length: u32,
}

impl RecordHeader {
    pub fn new(window_id: u8, length: u32) -> Self {
        Self { window_id, length }
    }

    /// Parse a header, validating every fixed marker byte.
    pub fn parse(bytes: &[u8; RECORD_HEADER_LEN]) -> Result<Self> {
        let window_id = bytes[6];
        let prefix_ok = bytes[0] == START && bytes[1..6].iter().all(|&b| b == FILL);
        if !prefix_ok || bytes[7] != FILL {
            return Err(PanelcastError::framing(format!(
                "record header invalid ![{}] _[{}] _[{}] _[{}] _[{}] _[{}] W[{}] _[{}]",
                show(bytes[0]),
                show(bytes[1]),
                show(bytes[2]),
                show(bytes[3]),
                show(bytes[4]),
                show(bytes[5]),
                window_id,
                show(bytes[7])
            )));
        }

        let length = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        if bytes[12..16].iter().any(|&b| b != FILL) {
            return Err(PanelcastError::framing(format!(
                "record second header invalid _[{}] _[{}] _[{}] _[{}]",
                show(bytes[12]),
                show(bytes[13]),
                show(bytes[14]),
                show(bytes[15])
            )));
        }

        Ok(Self { window_id, length })
    }

    /// Serialize the header as a host would send it
    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut out = [FILL; RECORD_HEADER_LEN];
        out[0] = START;
        out[6] = self.window_id;
        out[8..12].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Padding bytes that follow this record's payload
    pub fn padding_len(&self) -> u32 {
        padding_len(self.length)
    }

    /// Total bytes this record occupies on the wire, header included
    pub fn wire_len(&self) -> u64 {
        RECORD_HEADER_LEN as u64 + self.length as u64 + self.padding_len() as u64
    }
}

/// Write one complete record: header, payload and zero padding.
pub async fn write_record<W>(writer: &mut W, window_id: u8, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let length = u32::try_from(payload.len()).map_err(|_| {
        PanelcastError::framing(format!("payload of {} bytes exceeds u32 length", payload.len()))
    })?;
    let header = RecordHeader::new(window_id, length);

    let write_err = |e| PanelcastError::stream("record write", e);
    writer.write_all(&header.encode()).await.map_err(write_err)?;
    writer.write_all(payload).await.map_err(write_err)?;
    writer.write_all(&vec![0u8; header.padding_len() as usize]).await.map_err(write_err)?;
    Ok(())
}

fn show(byte: u8) -> String {
    byte.escape_ascii().to_string()
}
