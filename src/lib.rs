//! Client library for streamed cockpit textures.
//!
//! Panelcast connects to a flight simulator host plugin that renders cockpit
//! displays (PFD, ND, EICAS and so on) into textures and streams them over
//! TCP. The client reads the session handshake, picks one active window and
//! decodes and displays the newest frame for it, dropping frames whenever the
//! display falls behind.
//!
//! # Features
//!
//! - **Strict framing**: every record header is validated, a desynchronised
//!   stream is reported rather than guessed at
//! - **Latest frame wins**: a single-slot mailbox keeps latency bounded
//! - **Pluggable display**: bring your own [`DisplaySink`] and [`FrameDecoder`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use panelcast::{ClientConfig, DecodedFrame, DisplaySink, Panelcast};
//!
//! struct Log;
//!
//! impl DisplaySink for Log {
//!     fn target_size(&self) -> Option<(u32, u32)> {
//!         None
//!     }
//!
//!     fn present(&mut self, frame: DecodedFrame) {
//!         println!("window {} frame {}", frame.window_id, frame.sequence);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> panelcast::Result<()> {
//!     let client = Panelcast::connect(&ClientConfig::new("192.168.1.20")).await?;
//!     println!("Streaming {}", client.session().aircraft);
//!     client.run(Log).await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod protocol;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Receive pipeline
pub mod consumer;
pub mod demux;
pub mod display;
pub mod driver;
pub mod mailbox;
pub mod selector;

// Entry point
pub mod connection;

// Core exports
pub use config::{ClientConfig, DisplayMode};
pub use error::*;
pub use types::*;

// Pipeline exports
pub use consumer::ConsumerStats;
pub use demux::{ReceiverStats, RecordOutcome};
pub use display::{DecodedFrame, DisplaySink, FrameDecoder, LayoutRequest, PngDecoder};
pub use protocol::{Session, WindowBounds, WindowDescriptor};
pub use selector::ActiveWindow;

// Main API exports
pub use connection::StreamClient;

/// Unified entry point for Panelcast connections.
///
/// # Example
///
/// ```rust,no_run
/// use panelcast::{ClientConfig, Panelcast};
///
/// # #[tokio::main]
/// # async fn main() -> panelcast::Result<()> {
/// let config = ClientConfig::new("sim-pc").with_initial_window(1);
/// let client = Panelcast::connect(&config).await?;
/// # Ok(())
/// # }
/// ```
pub struct Panelcast;

impl Panelcast {
    /// Connect to a texture host and complete the handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The host cannot be reached
    /// - The handshake is truncated, malformed or for another protocol version
    pub async fn connect(config: &ClientConfig) -> Result<StreamClient> {
        StreamClient::connect(config).await
    }
}
