//! Core types flowing between the receive pipeline stages.
//!
//! - [`FramePayload`] is one undecoded frame handed from the network flow to the
//!   consumer flow through the [`Mailbox`](crate::mailbox::Mailbox)
//! - [`ClientStatus`] is the connection lifecycle published by a
//!   [`StreamClient`](crate::StreamClient)

mod frame;
mod status;

pub use frame::FramePayload;
pub use status::ClientStatus;
