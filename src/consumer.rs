//! Consumer flow: mailbox -> decoder -> display

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::display::{
    DecodedFrame, DisplaySink, FrameDecoder, LayoutRequest, LayoutTracker, Placement, fit,
};
use crate::mailbox::Mailbox;
use crate::protocol::Session;
use crate::selector::ActiveWindow;
use crate::types::{ClientStatus, FramePayload};
use crate::{DisplayMode, PanelcastError, Result};

/// Counters kept by the consumer flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub presented: u64,
    pub relayouts: u64,
}

/// Waits on the mailbox, decodes each frame and presents it
pub struct FrameConsumer<D, S> {
    mailbox: Arc<Mailbox>,
    selector: Arc<ActiveWindow>,
    session: Arc<Session>,
    decoder: Arc<D>,
    sink: S,
    layout: LayoutTracker,
    status: Option<watch::Sender<ClientStatus>>,
    stats: ConsumerStats,
}

impl<D, S> FrameConsumer<D, S>
where
    D: FrameDecoder,
    S: DisplaySink,
{
    pub fn new(
        mailbox: Arc<Mailbox>,
        selector: Arc<ActiveWindow>,
        session: Arc<Session>,
        decoder: D,
        sink: S,
        mode: DisplayMode,
    ) -> Self {
        Self {
            mailbox,
            selector,
            session,
            decoder: Arc::new(decoder),
            sink,
            layout: LayoutTracker::new(mode),
            status: None,
            stats: ConsumerStats::default(),
        }
    }

    /// Publish [`ClientStatus::Streaming`] here after the first presented frame
    pub fn with_status(mut self, status: watch::Sender<ClientStatus>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// The display sink, e.g. to inspect it after the flow ended
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Present frames until the mailbox is closed.
    ///
    /// Returns the first decode failure; a bad payload ends the session.
    pub async fn run(&mut self) -> Result<ConsumerStats> {
        let mailbox = Arc::clone(&self.mailbox);
        while let Some(delivery) = mailbox.recv().await {
            // The slot stays occupied until `delivery` drops after display
            self.process(delivery.payload()).await?;
        }
        debug!(presented = self.stats.presented, "Mailbox closed, consumer finished");
        Ok(self.stats)
    }

    async fn process(&mut self, payload: &FramePayload) -> Result<()> {
        let window_id = payload.window_id;
        let decoder = Arc::clone(&self.decoder);
        let data = Arc::clone(&payload.data);
        let image = tokio::task::spawn_blocking(move || decoder.decode(window_id, &data))
            .await
            .map_err(|e| PanelcastError::internal(format!("decode task failed: {}", e)))??;

        let (width, height) = image.dimensions();
        // Epoch first: a switch in between then only looks like a stale frame
        let epoch = self.selector.layout_epoch();
        let active = self.selector.is_active(window_id);
        let placement =
            self.layout.place(epoch, window_id, active, width, height, self.sink.target_size());
        trace!(window_id, sequence = payload.sequence, ?placement, "Presenting frame");

        let image = match placement {
            Placement::Natural => image,
            Placement::Scaled(w, h) => fit(image, w, h),
        };
        self.sink.present(DecodedFrame { window_id, sequence: payload.sequence, image });
        self.stats.presented += 1;

        if placement == Placement::Natural {
            let request = LayoutRequest { title: self.title(window_id), width, height };
            debug!(title = %request.title, width, height, "Laying out display");
            self.sink.relayout(&request);
            self.layout.mark_laid_out(window_id);
            self.stats.relayouts += 1;
        }

        // Announce streaming once, on the first presented frame
        if let (1, Some(status)) = (self.stats.presented, &self.status) {
            status.send_replace(ClientStatus::Streaming);
        }
        Ok(())
    }

    fn title(&self, window_id: u8) -> String {
        match self.session.window(usize::from(window_id)) {
            Some(window) => format!("{} {}", self.session.aircraft, window.name),
            None => self.session.aircraft.clone(),
        }
    }
}
