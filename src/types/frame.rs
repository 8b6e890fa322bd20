//! Frame payload type for the receive pipeline

use std::sync::Arc;

/// Raw payload of one record for the active window
///
/// The bytes are opaque to the protocol; the consumer hands them to a
/// [`FrameDecoder`](crate::display::FrameDecoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    /// Encoded image bytes (zero-copy via Arc)
    pub data: Arc<[u8]>,

    /// Window the record was addressed to
    pub window_id: u8,

    /// Position of the record on the wire, counting every record received
    pub sequence: u64,
}

impl FramePayload {
    /// Create a new frame payload
    pub fn new(data: Vec<u8>, window_id: u8, sequence: u64) -> Self {
        Self { data: data.into(), window_id, sequence }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero length payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
