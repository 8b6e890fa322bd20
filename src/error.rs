//! Error types for the texture stream client.
//!
//! Every error in this crate is fatal: the stream protocol has no way to
//! resynchronize once framing is lost, so nothing here is retried or
//! downgraded. Errors carry enough context for a diagnostic and map to a
//! distinct process exit status.
//!
//! ## Error Categories
//!
//! - **Connection**: the initial connect to the host failed
//! - **Handshake**: short preamble, protocol tag mismatch, malformed fields, no windows
//! - **Framing**: a fixed marker byte in a record header did not match
//! - **Stream**: a read failed after the handshake (peer closed, I/O failure)
//! - **Decode**: payload bytes the image decoder could not interpret
//! - **Config**: invalid client configuration
//!
//! ```rust
//! use panelcast::{ErrorCategory, PanelcastError};
//!
//! let error = PanelcastError::framing("byte 0 was 0x50, expected '!'");
//! assert_eq!(error.category(), ErrorCategory::Framing);
//! assert_ne!(error.exit_code(), 0);
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T, E = PanelcastError> = std::result::Result<T, E>;

/// Main error type for client operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PanelcastError {
    #[error("Failed to connect to texture host: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid handshake: {reason}")]
    Handshake { reason: String },

    #[error("Protocol version mismatch: expected {expected}, found {found}")]
    Version { expected: String, found: String },

    #[error("Record framing error: {details}")]
    Framing { details: String },

    #[error("Stream failed during {context}")]
    Stream {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode frame for window {window_id}")]
    Decode {
        window_id: u8,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Internal error: {details}")]
    Internal { details: String },
}

/// Coarse classification of a [`PanelcastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Connection,
    Handshake,
    Framing,
    Stream,
    Decode,
    Config,
    Internal,
}

impl PanelcastError {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PanelcastError::Connection { .. } => ErrorCategory::Connection,
            PanelcastError::Handshake { .. } => ErrorCategory::Handshake,
            PanelcastError::Version { .. } => ErrorCategory::Handshake,
            PanelcastError::Framing { .. } => ErrorCategory::Framing,
            PanelcastError::Stream { .. } => ErrorCategory::Stream,
            PanelcastError::Decode { .. } => ErrorCategory::Decode,
            PanelcastError::Config { .. } => ErrorCategory::Config,
            PanelcastError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Process exit status for the enclosing application.
    ///
    /// Always non-zero; each category gets its own value so scripts can tell
    /// a refused connection from a corrupted stream.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Internal => 1,
            ErrorCategory::Connection => 2,
            ErrorCategory::Handshake => 3,
            ErrorCategory::Framing => 4,
            ErrorCategory::Stream => 5,
            ErrorCategory::Decode => 6,
            ErrorCategory::Config => 7,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            PanelcastError::Connection { .. } => vec![
                "Ensure the simulator is running with the texture plugin loaded",
                "Check the host name and port",
                "Check firewall rules between client and host",
            ],
            PanelcastError::Handshake { .. } => vec![
                "Open a cockpit window in the simulator so the plugin advertises it",
                "Verify the host is a texture plugin and not another service",
            ],
            PanelcastError::Version { .. } => vec![
                "Install matching plugin and client versions",
                "Check the plugin log for its protocol version",
            ],
            PanelcastError::Framing { .. } => vec![
                "Restart the client to resynchronize with the host",
                "Check for a proxy or middlebox altering the stream",
            ],
            PanelcastError::Stream { .. } => vec![
                "Check whether the simulator was closed or the aircraft reloaded",
                "Check network stability between client and host",
            ],
            PanelcastError::Decode { .. } => vec![
                "Verify the plugin is sending PNG encoded frames",
                "Restart the client to resynchronize with the host",
            ],
            PanelcastError::Config { .. } => vec![
                "Check the configuration file for typos",
                "Compare against the documented configuration fields",
            ],
            PanelcastError::Internal { .. } => vec!["Report the issue with the full log output"],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        PanelcastError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PanelcastError::Connection { reason: reason.into(), source: Some(source.into()) }
    }

    /// Helper constructor for handshake errors.
    pub fn handshake(reason: impl Into<String>) -> Self {
        PanelcastError::Handshake { reason: reason.into() }
    }

    /// Helper constructor for framing errors.
    pub fn framing(details: impl Into<String>) -> Self {
        PanelcastError::Framing { details: details.into() }
    }

    /// Helper constructor for stream read errors with context.
    pub fn stream(context: impl Into<String>, source: std::io::Error) -> Self {
        PanelcastError::Stream { context: context.into(), source }
    }

    /// Helper constructor for decode errors.
    pub fn decode(
        window_id: u8,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PanelcastError::Decode { window_id, source: source.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        PanelcastError::Config { reason: reason.into() }
    }

    /// Helper constructor for internal errors.
    pub fn internal(details: impl Into<String>) -> Self {
        PanelcastError::Internal { details: details.into() }
    }
}

impl From<std::io::Error> for PanelcastError {
    fn from(err: std::io::Error) -> Self {
        PanelcastError::Stream { context: "stream read".to_string(), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            details in ".*",
            expected in "[A-Za-z0-9]{1,8}",
            found in "[A-Za-z0-9]{1,8}",
            window_id in any::<u8>()
        ) {
            let connection = PanelcastError::connection_failed(reason.clone());
            prop_assert!(connection.to_string().contains(&reason));

            let framing = PanelcastError::framing(details.clone());
            prop_assert!(framing.to_string().contains(&details));

            let version = PanelcastError::Version { expected: expected.clone(), found: found.clone() };
            let version_msg = version.to_string();
            prop_assert!(version_msg.contains(&expected));
            prop_assert!(version_msg.contains(&found));

            let decode = PanelcastError::decode(window_id, "bad png");
            prop_assert!(decode.to_string().contains(&window_id.to_string()));
        }

        #[test]
        fn io_errors_keep_their_message(message in ".*") {
            let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, message.clone());
            let converted: PanelcastError = io_err.into();
            match converted {
                PanelcastError::Stream { source, .. } => {
                    prop_assert_eq!(source.to_string(), message);
                }
                _ => prop_assert!(false, "Expected Stream error from io::Error conversion"),
            }
        }
    }

    #[test]
    fn version_mismatch_is_a_handshake_failure() {
        let error = PanelcastError::Version { expected: "XTEv3".into(), found: "XTEv1".into() };
        assert_eq!(error.category(), ErrorCategory::Handshake);
        assert_eq!(error.exit_code(), PanelcastError::handshake("x").exit_code());
    }

    #[test]
    fn exit_codes_are_non_zero_and_distinct_per_category() {
        let errors = [
            PanelcastError::connection_failed("refused"),
            PanelcastError::handshake("no windows"),
            PanelcastError::framing("bad marker"),
            PanelcastError::stream(
                "payload",
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"),
            ),
            PanelcastError::decode(0, "garbage"),
            PanelcastError::config("empty host"),
            PanelcastError::internal("join failed"),
        ];

        let mut codes: Vec<i32> = errors.iter().map(PanelcastError::exit_code).collect();
        assert!(codes.iter().all(|code| *code != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn source_chain_is_preserved() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = PanelcastError::connection_failed_with_source("host:52500", io_err);
        let source = std::error::Error::source(&error).expect("source should be kept");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn every_error_has_suggestions() {
        let errors = [
            PanelcastError::connection_failed("refused"),
            PanelcastError::Version { expected: "a".into(), found: "b".into() },
            PanelcastError::framing("bad marker"),
            PanelcastError::internal("panic"),
        ];
        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn error_is_send_sync_static() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<PanelcastError>();
    }
}
