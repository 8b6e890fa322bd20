//! Decode and display collaborators
//!
//! The receive pipeline does not draw anything itself. It decodes payloads
//! through a [`FrameDecoder`] and hands bitmaps to a [`DisplaySink`], which
//! wraps whatever toolkit the application uses. [`LayoutTracker`] holds the
//! sizing policy shared by every sink:
//!
//! - After a window switch the first frame of the newly selected window is
//!   shown at its natural size and the sink is asked to lay itself out around
//!   it. Frames of the previous selection that were already in flight are
//!   scaled and do not trigger the relayout.
//! - Once laid out, frames are scaled to the sink's current size.
//! - Fullscreen and fixed geometry modes always scale and never relayout.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::config::DisplayMode;
use crate::{PanelcastError, Result};

/// Turns payload bytes into a bitmap
pub trait FrameDecoder: Send + Sync + 'static {
    /// Decode one payload. `window_id` is only used for error context.
    fn decode(&self, window_id: u8, data: &[u8]) -> Result<RgbaImage>;
}

/// Default decoder backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl FrameDecoder for PngDecoder {
    fn decode(&self, window_id: u8, data: &[u8]) -> Result<RgbaImage> {
        image::load_from_memory(data)
            .map(|image| image.into_rgba8())
            .map_err(|e| PanelcastError::decode(window_id, e))
    }
}

/// A decoded frame ready for display
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub window_id: u8,
    pub sequence: u64,
    pub image: RgbaImage,
}

/// Relayout request sent when a newly selected window shows its first frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRequest {
    /// Suggested title: aircraft and window name
    pub title: String,
    /// Natural size of the frame
    pub width: u32,
    pub height: u32,
}

/// Where decoded frames end up
pub trait DisplaySink: Send + 'static {
    /// Current drawable size, `None` before the sink has been shown
    fn target_size(&self) -> Option<(u32, u32)>;

    /// Show a frame
    fn present(&mut self, frame: DecodedFrame);

    /// Lay the display out around a frame of the given size
    fn relayout(&mut self, _request: &LayoutRequest) {}
}

/// Decides whether a frame is scaled and when the sink relays out
#[derive(Debug)]
pub struct LayoutTracker {
    mode: DisplayMode,
    /// Window the sink was last laid out for, cleared by a selection change
    laid_out_for: Option<u8>,
    epoch: u64,
}

/// Sizing decision for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Present at natural size, then relayout the sink
    Natural,
    /// Scale to this size
    Scaled(u32, u32),
}

impl LayoutTracker {
    pub fn new(mode: DisplayMode) -> Self {
        Self { mode, laid_out_for: None, epoch: 0 }
    }

    /// Decide how to place a `width` x `height` frame from `window_id`.
    ///
    /// `epoch` is the selector's current layout epoch; a change since the last
    /// call forgets the previous layout. `active` says whether `window_id` is
    /// still the selected window. A frame read just before a switch is scaled
    /// into the current layout and never triggers a relayout, so the first
    /// frame of the newly selected window gets it.
    pub fn place(
        &mut self,
        epoch: u64,
        window_id: u8,
        active: bool,
        width: u32,
        height: u32,
        target: Option<(u32, u32)>,
    ) -> Placement {
        if epoch != self.epoch {
            debug!(epoch, "Window selection changed, layout invalidated");
            self.epoch = epoch;
            self.laid_out_for = None;
        }

        let scale_to_target = || match target {
            Some((w, h)) if w > 1 && h > 1 => Placement::Scaled(w, h),
            _ => {
                debug!("Fixing up empty target to size {}x{}", width, height);
                Placement::Scaled(width, height)
            }
        };

        match self.mode {
            DisplayMode::Geometry { width, height } => Placement::Scaled(width, height),
            DisplayMode::Fullscreen => scale_to_target(),
            DisplayMode::Windowed if self.laid_out_for == Some(window_id) => scale_to_target(),
            DisplayMode::Windowed if !active => {
                debug!(window_id, "Frame from previous selection, not laying out");
                scale_to_target()
            }
            DisplayMode::Windowed => Placement::Natural,
        }
    }

    /// Record that the sink has been laid out around `window_id`
    pub fn mark_laid_out(&mut self, window_id: u8) {
        self.laid_out_for = Some(window_id);
    }

    pub fn is_laid_out(&self) -> bool {
        self.laid_out_for.is_some()
    }
}

/// Scale `image` to exactly `width` x `height`; returned unchanged if it already fits
pub fn fit(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    imageops::resize(&image, width, height, FilterType::Lanczos3)
}
