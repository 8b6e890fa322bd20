//! Connection lifecycle states

/// Lifecycle of a stream client as seen by status subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStatus {
    /// Handshake accepted; no frame displayed yet
    Connected {
        /// Aircraft advertised by the host
        aircraft: String,
        /// Number of advertised windows
        windows: usize,
    },

    /// At least one frame has reached the display
    Streaming,

    /// The client stopped; `reason` is the fatal error's message
    Disconnected { reason: String },
}

impl ClientStatus {
    /// True once the client has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClientStatus::Disconnected { .. })
    }
}
