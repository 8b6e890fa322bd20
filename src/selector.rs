//! Active window selection shared between the UI and the receiver

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{info, warn};

/// Index of the window currently being decoded and displayed
///
/// Written by an external trigger ([`advance`](Self::advance)), read by the
/// demultiplexer for every record. Reads are relaxed: a stale read costs at
/// most one extra frame for the previous selection, which the display layout
/// logic absorbs.
#[derive(Debug)]
pub struct ActiveWindow {
    index: AtomicUsize,
    count: usize,
    layout_epoch: AtomicU64,
}

impl ActiveWindow {
    /// Resolve the externally requested initial index against the window count.
    ///
    /// Negative or missing values select window 0. Values past the end also
    /// select window 0, with a diagnostic.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero; a session always advertises at least one window.
    pub fn resolve(requested: Option<i64>, count: usize) -> Self {
        assert!(count > 0, "active window requires at least one window");

        let index = match requested {
            None => 0,
            Some(value) if value < 0 => 0,
            Some(value) => match usize::try_from(value) {
                Ok(index) if index < count => index,
                _ => {
                    warn!(
                        "Manual window id {} is out of bounds {} so setting to 0",
                        value, count
                    );
                    0
                }
            },
        };

        Self { index: AtomicUsize::new(index), count, layout_epoch: AtomicU64::new(0) }
    }

    /// Currently selected window index, always below [`count`](Self::count)
    pub fn current(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// True if records for `window_id` should be decoded
    pub fn is_active(&self, window_id: u8) -> bool {
        usize::from(window_id) == self.current()
    }

    /// Number of windows in the session
    pub fn count(&self) -> usize {
        self.count
    }

    /// Select the next window, wrapping to 0 after the last one.
    ///
    /// Also invalidates the display layout so the next frame for the new
    /// window is laid out afresh. Returns the new index.
    pub fn advance(&self) -> usize {
        let count = self.count;
        let previous = self
            .index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % count))
            .unwrap_or_default();
        let next = (previous + 1) % count;
        self.layout_epoch.fetch_add(1, Ordering::Release);

        info!("Detected window advance, adjusted to {}", next);
        next
    }

    /// Counter bumped on every selection change.
    ///
    /// The display compares it against the value it last laid out for.
    pub fn layout_epoch(&self) -> u64 {
        self.layout_epoch.load(Ordering::Acquire)
    }
}
