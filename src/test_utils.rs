//! Test fixtures shared by unit tests, integration tests and benchmarks
//!
//! Builds wire bytes the way a host would and provides display sinks that
//! record what they were asked to show.

#![cfg(any(test, feature = "benchmark"))]

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use tokio::sync::mpsc;

use crate::display::{DecodedFrame, DisplaySink, LayoutRequest};
use crate::protocol::{
    HANDSHAKE_LEN, PROTOCOL_VERSION, RecordHeader, Session, WindowBounds, WindowDescriptor,
};

/// NUL pad handshake `text` to a full block.
///
/// Panics if the text does not fit; fixtures are expected to be small.
pub fn handshake_block(text: &str) -> Vec<u8> {
    assert!(text.len() <= HANDSHAKE_LEN, "fixture handshake too long: {} bytes", text.len());
    let mut block = text.as_bytes().to_vec();
    block.resize(HANDSHAKE_LEN, 0);
    block
}

/// Session for aircraft `TEST-AC` with windows `WIN0`, `WIN1`, ...
pub fn sample_session(windows: usize) -> Session {
    Session {
        version: PROTOCOL_VERSION.to_string(),
        aircraft: "TEST-AC".to_string(),
        texture_width: 1024,
        texture_height: 1024,
        windows: (0..windows)
            .map(|i| {
                let left = (i as i32 % 4) * 256;
                let top = (i as i32 / 4) * 256;
                WindowDescriptor {
                    name: format!("WIN{}", i),
                    bounds: WindowBounds { left, top, right: left + 256, bottom: top + 256 },
                }
            })
            .collect(),
    }
}

/// One complete record: header, payload and zero padding
pub fn record_bytes(window_id: u8, payload: &[u8]) -> Vec<u8> {
    let header = RecordHeader::new(window_id, payload.len() as u32);
    let mut bytes = Vec::with_capacity(header.wire_len() as usize);
    bytes.extend_from_slice(&header.encode());
    bytes.extend_from_slice(payload);
    bytes.resize(header.wire_len() as usize, 0);
    bytes
}

/// PNG bytes of a `width` x `height` image filled with `rgba`
pub fn png_payload(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    out.into_inner()
}

/// Sink that keeps every frame and layout request
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub target: Option<(u32, u32)>,
    pub frames: Vec<DecodedFrame>,
    pub layouts: Vec<LayoutRequest>,
}

impl RecordingSink {
    pub fn with_target(width: u32, height: u32) -> Self {
        Self { target: Some((width, height)), ..Self::default() }
    }

    /// Presented image sizes in order
    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.frames.iter().map(|frame| frame.image.dimensions()).collect()
    }
}

impl DisplaySink for RecordingSink {
    fn target_size(&self) -> Option<(u32, u32)> {
        self.target
    }

    fn present(&mut self, frame: DecodedFrame) {
        self.frames.push(frame);
    }

    fn relayout(&mut self, request: &LayoutRequest) {
        self.layouts.push(request.clone());
    }
}

/// What a [`ChannelSink`] forwards
#[derive(Debug, Clone)]
pub enum SinkEvent {
    Frame(DecodedFrame),
    Layout(LayoutRequest),
}

/// Sink that forwards events to a test running on another task
#[derive(Debug)]
pub struct ChannelSink {
    events: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }
}

impl DisplaySink for ChannelSink {
    fn target_size(&self) -> Option<(u32, u32)> {
        None
    }

    fn present(&mut self, frame: DecodedFrame) {
        // The test may have stopped listening
        let _ = self.events.send(SinkEvent::Frame(frame));
    }

    fn relayout(&mut self, request: &LayoutRequest) {
        let _ = self.events.send(SinkEvent::Layout(request.clone()));
    }
}
