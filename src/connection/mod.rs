//! Connection to a cockpit texture host
//!
//! [`StreamClient`] owns the byte stream after a successful handshake. It
//! exposes the session description and the window selector, and runs the
//! receive pipeline until the stream fails or the client is shut down.

use std::sync::Arc;

use futures::Stream;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{ClientConfig, DisplayMode};
use crate::consumer::{ConsumerStats, FrameConsumer};
use crate::demux::{FrameDemuxer, ReceiverStats};
use crate::display::{DisplaySink, FrameDecoder, PngDecoder};
use crate::driver::Driver;
use crate::mailbox::Mailbox;
use crate::protocol::Session;
use crate::selector::ActiveWindow;
use crate::types::ClientStatus;
use crate::{PanelcastError, Result};

#[cfg(test)]
mod tests;

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// A connected, handshaken client ready to stream frames
pub struct StreamClient {
    /// Stream positioned at the first record header
    reader: BoxedReader,

    /// Handshake result
    session: Arc<Session>,

    /// Shared with the receiver and the application
    selector: Arc<ActiveWindow>,

    display: DisplayMode,

    /// Status publisher and a receiver kept so the channel never closes early
    status: watch::Sender<ClientStatus>,
    status_rx: watch::Receiver<ClientStatus>,

    /// Stops a running pipeline
    cancel: CancellationToken,
}

impl StreamClient {
    /// Connect over TCP and perform the handshake.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let address = config.address();
        info!("Connecting to texture host at {}", address);

        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|e| {
                PanelcastError::connection_failed_with_source(
                    format!("cannot connect to {}", address),
                    e,
                )
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle on {}: {}", address, e);
        }
        info!("Connected to {}", address);

        Self::from_stream(stream, config).await
    }

    /// Perform the handshake over an already established stream.
    ///
    /// `config` is validated as a whole, but only its `initial_window` and
    /// `display` settings are used.
    pub async fn from_stream<S>(mut stream: S, config: &ClientConfig) -> Result<Self>
    where
        S: AsyncRead + Unpin + Send + 'static,
    {
        // Reject a zero display geometry before any byte is read
        config.validate()?;

        let session = Session::read_from(&mut stream).await?;
        // Parse guarantees at least one window, so resolve cannot panic
        let selector = ActiveWindow::resolve(config.initial_window, session.window_count());
        info!(
            aircraft = %session.aircraft,
            windows = session.window_count(),
            active = selector.current(),
            "Handshake complete"
        );

        // Subscribers created before `run` see every later transition
        let (status, status_rx) = watch::channel(ClientStatus::Connected {
            aircraft: session.aircraft.clone(),
            windows: session.window_count(),
        });

        Ok(Self {
            reader: Box::new(stream),
            session: Arc::new(session),
            selector: Arc::new(selector),
            display: config.display,
            status,
            status_rx,
            cancel: CancellationToken::new(),
        })
    }

    /// Session announced by the host
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Window selector; call [`ActiveWindow::advance`] to cycle windows
    pub fn selector(&self) -> Arc<ActiveWindow> {
        Arc::clone(&self.selector)
    }

    /// Token that stops [`run`](Self::run) cleanly when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Status changes as a stream, starting with the current status
    pub fn status_updates(&self) -> impl Stream<Item = ClientStatus> + 'static {
        WatchStream::new(self.status_rx.clone())
    }

    pub fn current_status(&self) -> ClientStatus {
        self.status_rx.borrow().clone()
    }

    /// Run the pipeline with the PNG decoder until the stream fails.
    pub async fn run<S: DisplaySink>(self, sink: S) -> Result<(ReceiverStats, ConsumerStats)> {
        self.run_with_decoder(PngDecoder, sink).await
    }

    /// Run the pipeline with a custom decoder.
    ///
    /// Returns the first fatal error of either flow. `Ok` means the
    /// [`shutdown_token`](Self::shutdown_token) was cancelled.
    pub async fn run_with_decoder<D, S>(
        self,
        decoder: D,
        sink: S,
    ) -> Result<(ReceiverStats, ConsumerStats)>
    where
        D: FrameDecoder,
        S: DisplaySink,
    {
        let StreamClient { reader, session, selector, display, status, status_rx: _, cancel } =
            self;

        // The receiver fills and the consumer drains this one slot
        let mailbox = Arc::new(Mailbox::new());
        let demuxer = FrameDemuxer::new(reader, Arc::clone(&selector), Arc::clone(&mailbox));
        let consumer = FrameConsumer::new(mailbox, selector, session, decoder, sink, display)
            .with_status(status.clone());

        // Child token: the driver cancels it on failure without touching ours
        let result = Driver::spawn(demuxer, consumer, cancel.child_token()).join().await;

        let reason = match &result {
            Ok(_) => "shut down".to_string(),
            Err(e) => {
                error!("Session ended: {}", e);
                e.to_string()
            }
        };
        // send_replace: subscribers may all be gone by now
        status.send_replace(ClientStatus::Disconnected { reason });
        result
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("session", &self.session)
            .field("active", &self.selector.current())
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
