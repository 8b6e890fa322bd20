//! Wire protocol for the cockpit texture stream
//!
//! A connection starts with a fixed-size text handshake followed by an
//! endless sequence of binary records:
//!
//! ```text
//! handshake:  HANDSHAKE_LEN bytes, NUL terminated text
//!   XTEv3 <anything>
//!   <aircraft name>
//!   <texture width> <texture height>
//!   <window name> <left> <top> <right> <bottom>    (one per window)
//!   __EOF__
//!
//! record:     '!' '_' '_' '_' '_' '_' <window id> '_'
//!             <payload length: u32 little endian>
//!             '_' '_' '_' '_'
//!             <payload: length bytes>
//!             <padding: 1024 - (length % 1024) bytes>
//! ```

pub mod handshake;
pub mod record;

pub use handshake::{Session, WindowBounds, WindowDescriptor};
pub use record::{RecordHeader, padding_len, write_record};

/// Protocol tag the host must advertise as the first handshake token
pub const PROTOCOL_VERSION: &str = "XTEv3";

/// Size of the handshake block sent once per connection
pub const HANDSHAKE_LEN: usize = 4096;

/// Token marking the end of the window list in the handshake
pub const END_MARKER: &str = "__EOF__";

/// Default TCP port of the texture host
pub const DEFAULT_PORT: u16 = 52500;

/// Record payloads are padded up to this alignment
pub const PAD_ALIGN: u32 = 1024;

/// Size of the fixed record header
pub const RECORD_HEADER_LEN: usize = 16;
