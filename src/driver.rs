//! Driver spawns and joins the receiver and consumer tasks

use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::consumer::{ConsumerStats, FrameConsumer};
use crate::demux::{FrameDemuxer, ReceiverStats};
use crate::display::{DisplaySink, FrameDecoder};
use crate::{PanelcastError, Result};

/// Handles to the two running flows
pub struct DriverHandles {
    /// Receiver task; ends with the stream failure
    pub receiver: JoinHandle<Result<ReceiverStats>>,
    /// Consumer task; ends when the mailbox closes or a frame fails to decode
    pub consumer: JoinHandle<Result<ConsumerStats>>,
    /// Stops whichever task is still running
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the receive pipeline tasks
///
/// Exactly two tasks run per connection: the receiver, which owns the stream
/// and demultiplexes records into the mailbox, and the consumer, which decodes
/// and displays. There is no pool and no further scheduling.
pub struct Driver;

impl Driver {
    /// Spawn both flows.
    ///
    /// `demuxer` and `consumer` must share one mailbox. The receiver closes it
    /// when it stops so the consumer can finish. Cancelling `cancel` stops
    /// both flows.
    pub fn spawn<R, D, S>(
        mut demuxer: FrameDemuxer<R>,
        mut consumer: FrameConsumer<D, S>,
        cancel: CancellationToken,
    ) -> DriverHandles
    where
        R: AsyncRead + Unpin + Send + 'static,
        D: FrameDecoder,
        S: DisplaySink,
    {
        // Receiver task: owns the stream until it fails or is cancelled
        let cancel_receiver = cancel.clone();
        let receiver = tokio::spawn(async move {
            info!("Receiver task started");
            let result = tokio::select! {
                _ = cancel_receiver.cancelled() => {
                    info!("Receiver cancelled");
                    Ok(())
                }
                result = demuxer.run() => result,
            };
            // Lets the consumer finish the frame in hand and then stop
            demuxer.mailbox().close();

            let stats = demuxer.stats();
            info!(
                records = stats.records,
                delivered = stats.delivered,
                skipped_inactive = stats.skipped_inactive,
                dropped_busy = stats.dropped_busy,
                bytes = stats.bytes,
                "Receiver task ended"
            );
            result.map(|()| stats).inspect_err(|e| error!("Receiver failed: {}", e))
        });

        // Consumer task: decodes and presents until the mailbox closes
        let cancel_consumer = cancel.clone();
        let consumer = tokio::spawn(async move {
            info!("Consumer task started");
            let result = tokio::select! {
                _ = cancel_consumer.cancelled() => {
                    info!("Consumer cancelled");
                    Ok(consumer.stats())
                }
                result = consumer.run() => result,
            };
            info!(presented = consumer.stats().presented, "Consumer task ended");
            result.inspect_err(|e| error!("Consumer failed: {}", e))
        });

        DriverHandles { receiver, consumer, cancel }
    }
}

impl DriverHandles {
    /// Wait for the first fatal error from either flow.
    ///
    /// The other flow is cancelled as soon as one ends. Returns `Ok` only if
    /// both flows were cancelled from outside.
    pub async fn join(self) -> Result<(ReceiverStats, ConsumerStats)> {
        let DriverHandles { mut receiver, mut consumer, cancel } = self;

        tokio::select! {
            received = &mut receiver => {
                // Stream failure is the cause; the consumer only drains
                cancel.cancel();
                let received = flatten(received)?;
                let consumed = flatten(consumer.await)?;
                Ok((received, consumed))
            }
            consumed = &mut consumer => {
                cancel.cancel();
                // A decode failure is the cause; the receiver only saw the cancel
                let consumed = flatten(consumed)?;
                let received = flatten(receiver.await)?;
                Ok((received, consumed))
            }
        }
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    joined.map_err(|e| PanelcastError::internal(format!("task failed: {}", e)))?
}
