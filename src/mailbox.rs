//! Single-slot handoff between the receiver and the consumer
//!
//! The mailbox never holds more than one frame. The receiver must win a
//! [`SlotClaim`] before it reads a payload off the wire; if the consumer is
//! still busy with the previous frame the claim fails and the receiver skips
//! the payload instead. Freshness wins over completeness: no frame is ever
//! queued for later.
//!
//! Slot lifecycle:
//!
//! ```text
//! Empty --try_claim--> Claimed --fill--> Filled --recv--> Processing --drop Delivery--> Empty
//!                         \--drop claim--> Empty
//! ```
//!
//! The occupancy test and the reservation happen under the same lock the
//! consumer uses to clear the slot, so a check-then-write can never overwrite
//! a frame the consumer has not finished with.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::trace;

use crate::types::FramePayload;

#[derive(Debug)]
enum Slot {
    Empty,
    Claimed,
    Filled(FramePayload),
    Processing,
}

#[derive(Debug)]
struct State {
    slot: Slot,
    closed: bool,
}

/// Single-capacity frame exchange with drop-on-contention semantics
#[derive(Debug)]
pub struct Mailbox {
    state: Mutex<State>,
    filled: Notify,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    pub fn new() -> Self {
        Self { state: Mutex::new(State { slot: Slot::Empty, closed: false }), filled: Notify::new() }
    }

    // The critical sections never panic, so a poisoned lock still holds a
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve the slot if it is empty.
    ///
    /// Returns `None` while a frame is claimed, pending or being processed,
    /// and after the mailbox is closed.
    pub fn try_claim(&self) -> Option<SlotClaim<'_>> {
        let mut state = self.lock();
        if state.closed || !matches!(state.slot, Slot::Empty) {
            return None;
        }
        state.slot = Slot::Claimed;
        Some(SlotClaim { mailbox: self, filled: false })
    }

    /// True if the slot holds or is about to hold a frame
    pub fn is_occupied(&self) -> bool {
        !matches!(self.lock().slot, Slot::Empty)
    }

    /// Wait for the next frame.
    ///
    /// Returns `None` once the mailbox is closed and no filled frame remains.
    /// The slot stays occupied until the returned [`Delivery`] is dropped.
    pub async fn recv(&self) -> Option<Delivery<'_>> {
        loop {
            // A fill after the check below leaves a permit, so the await
            // cannot miss it.
            let notified = self.filled.notified();
            {
                let mut state = self.lock();
                if matches!(state.slot, Slot::Filled(_)) {
                    if let Slot::Filled(payload) =
                        std::mem::replace(&mut state.slot, Slot::Processing)
                    {
                        return Some(Delivery { mailbox: self, payload });
                    }
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stop accepting frames and wake the consumer.
    ///
    /// A frame already filled is still delivered; an outstanding claim can no
    /// longer be filled.
    pub fn close(&self) {
        self.lock().closed = true;
        self.filled.notify_waiters();
        self.filled.notify_one();
    }

    /// True after [`close`](Self::close)
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Exclusive reservation of the empty slot, held while the payload is read
#[derive(Debug)]
pub struct SlotClaim<'a> {
    mailbox: &'a Mailbox,
    filled: bool,
}

impl SlotClaim<'_> {
    /// Place the payload in the slot and wake the consumer.
    ///
    /// Returns `false` if the mailbox was closed while the claim was held; the
    /// payload is dropped in that case.
    pub fn fill(mut self, payload: FramePayload) -> bool {
        let mut state = self.mailbox.lock();
        if state.closed {
            state.slot = Slot::Empty;
            self.filled = true;
            return false;
        }

        trace!(window_id = payload.window_id, len = payload.len(), "Filling mailbox slot");
        state.slot = Slot::Filled(payload);
        drop(state);
        self.filled = true;
        self.mailbox.filled.notify_one();
        true
    }
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        if !self.filled {
            self.mailbox.lock().slot = Slot::Empty;
        }
    }
}

/// A frame taken from the mailbox
///
/// The slot is cleared when this is dropped, i.e. after the consumer has
/// finished decoding and displaying the frame.
#[derive(Debug)]
pub struct Delivery<'a> {
    mailbox: &'a Mailbox,
    payload: FramePayload,
}

impl Delivery<'_> {
    /// The delivered frame
    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        self.mailbox.lock().slot = Slot::Empty;
    }
}
