//! Frame demultiplexer: the per-record receive state machine
//!
//! For every record on the wire the demultiplexer reads the header, then
//! either reads the payload into the [`Mailbox`] or skips it, and finally
//! consumes the alignment padding. Skipped payloads are still consumed byte
//! for byte so the next header starts where it should.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::mailbox::Mailbox;
use crate::protocol::{RECORD_HEADER_LEN, RecordHeader};
use crate::selector::ActiveWindow;
use crate::types::FramePayload;
use crate::{PanelcastError, Result};

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Payload read and handed to the mailbox
    Delivered { window_id: u8, length: u32 },
    /// Record for a window other than the active one, payload skipped
    SkippedInactive { window_id: u8, length: u32 },
    /// Active window but the consumer was still busy (or gone), payload discarded
    DroppedBusy { window_id: u8, length: u32 },
}

/// Counters kept by the receiver flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub records: u64,
    pub delivered: u64,
    pub skipped_inactive: u64,
    pub dropped_busy: u64,
    /// Every byte consumed after the handshake, headers and padding included
    pub bytes: u64,
}

impl ReceiverStats {
    fn record(&mut self, outcome: RecordOutcome, wire_len: u64) {
        self.records += 1;
        self.bytes += wire_len;
        match outcome {
            RecordOutcome::Delivered { .. } => self.delivered += 1,
            RecordOutcome::SkippedInactive { .. } => self.skipped_inactive += 1,
            RecordOutcome::DroppedBusy { .. } => self.dropped_busy += 1,
        }
    }
}

/// Reads records from the stream and routes active-window payloads to the mailbox
pub struct FrameDemuxer<R> {
    reader: R,
    selector: Arc<ActiveWindow>,
    mailbox: Arc<Mailbox>,
    stats: ReceiverStats,
}

impl<R> FrameDemuxer<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a demultiplexer positioned at the first record header
    pub fn new(reader: R, selector: Arc<ActiveWindow>, mailbox: Arc<Mailbox>) -> Self {
        Self { reader, selector, mailbox, stats: ReceiverStats::default() }
    }

    /// Mailbox fed by this demultiplexer
    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Counters so far
    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Process records until the stream fails.
    ///
    /// Only returns on error: a closed stream is a failure for this protocol.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.next_record().await?;
        }
    }

    /// Process exactly one record.
    pub async fn next_record(&mut self) -> Result<RecordOutcome> {
        let header = self.read_header().await?;
        let RecordHeader { window_id, length } = header;
        let sequence = self.stats.records;

        // Own handle so the claim does not borrow `self` across the reads
        let mailbox = Arc::clone(&self.mailbox);

        let outcome = if !self.selector.is_active(window_id) {
            self.skip(length as u64, "skipping inactive payload").await?;
            RecordOutcome::SkippedInactive { window_id, length }
        } else {
            match mailbox.try_claim() {
                Some(claim) => {
                    let data = self.read_payload(length).await?;
                    if claim.fill(FramePayload::new(data, window_id, sequence)) {
                        RecordOutcome::Delivered { window_id, length }
                    } else {
                        debug!(window_id, sequence, "Mailbox closed while reading, frame dropped");
                        RecordOutcome::DroppedBusy { window_id, length }
                    }
                }
                None => {
                    self.skip(length as u64, "skipping payload for busy consumer").await?;
                    RecordOutcome::DroppedBusy { window_id, length }
                }
            }
        };

        self.skip(header.padding_len() as u64, "padding").await?;

        trace!(sequence, ?outcome, "Record processed");
        self.stats.record(outcome, header.wire_len());
        Ok(outcome)
    }

    async fn read_header(&mut self) -> Result<RecordHeader> {
        let mut bytes = [0u8; RECORD_HEADER_LEN];
        self.reader
            .read_exact(&mut bytes)
            .await
            .map_err(|e| PanelcastError::stream("record header", e))?;
        RecordHeader::parse(&bytes).inspect_err(|e| {
            debug!(records = self.stats.records, "Framing lost: {}", e);
        })
    }

    async fn read_payload(&mut self, length: u32) -> Result<Vec<u8>> {
        // Grow as bytes arrive rather than trusting the length up front
        let mut data = Vec::with_capacity((length as usize).min(1 << 20));
        let read = (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut data)
            .await
            .map_err(|e| PanelcastError::stream("payload", e))?;
        if read != length as usize {
            return Err(truncated("payload", read as u64, length as u64));
        }
        Ok(data)
    }

    async fn skip(&mut self, count: u64, context: &'static str) -> Result<()> {
        let skipped = tokio::io::copy(&mut (&mut self.reader).take(count), &mut tokio::io::sink())
            .await
            .map_err(|e| PanelcastError::stream(context, e))?;
        if skipped != count {
            return Err(truncated(context, skipped, count));
        }
        Ok(())
    }
}

fn truncated(context: &'static str, got: u64, expected: u64) -> PanelcastError {
    PanelcastError::stream(
        context,
        std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("stream ended after {} of {} bytes", got, expected),
        ),
    )
}
