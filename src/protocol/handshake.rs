//! Handshake block parsing
//!
//! The host opens every connection with a [`HANDSHAKE_LEN`] byte block of
//! NUL terminated text describing the session and the windows it will stream.
//! Parsing is a pure function of the block: the same bytes always give the
//! same [`Session`].
//!
//! Every malformed field is fatal. There is no best-effort recovery because a
//! wrong window table would silently route frames to the wrong display.

use std::collections::HashSet;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use super::{END_MARKER, HANDSHAKE_LEN, PROTOCOL_VERSION};
use crate::{PanelcastError, Result};

/// Bounding box of a window inside the simulator texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowBounds {
    /// Horizontal extent regardless of which edge the host put first
    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    /// Vertical extent; GL texture coordinates put bottom below top
    pub fn height(&self) -> u32 {
        self.bottom.abs_diff(self.top)
    }
}

/// One window advertised by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowDescriptor {
    /// Window name, unique within a session
    pub name: String,
    /// Location inside the texture
    pub bounds: WindowBounds,
}

/// Session metadata from the handshake
///
/// Immutable once parsed. The window order is significant: record window ids
/// and the active window index both index into [`Session::windows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Protocol version tag, always [`PROTOCOL_VERSION`] after a successful parse
    pub version: String,
    /// Aircraft loaded in the simulator
    pub aircraft: String,
    /// Advertised texture width in pixels
    pub texture_width: u32,
    /// Advertised texture height in pixels
    pub texture_height: u32,
    /// Windows in host order
    pub windows: Vec<WindowDescriptor>,
}

impl Session {
    /// Read exactly one handshake block from the stream and parse it.
    ///
    /// A stream that ends before [`HANDSHAKE_LEN`] bytes arrive is a
    /// handshake failure, not a stream failure: no session ever existed.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut block = vec![0u8; HANDSHAKE_LEN];
        reader.read_exact(&mut block).await.map_err(|e| {
            PanelcastError::handshake(format!(
                "failed to receive {} byte handshake block: {}",
                HANDSHAKE_LEN, e
            ))
        })?;

        let session = Self::parse(&block)?;
        info!(
            version = %session.version,
            aircraft = %session.aircraft,
            texture_width = session.texture_width,
            texture_height = session.texture_height,
            windows = session.windows.len(),
            "Received handshake"
        );
        Ok(session)
    }

    /// Parse a handshake block.
    ///
    /// Text after the first NUL byte is ignored, as is everything after the
    /// [`END_MARKER`] line.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let end = block.iter().position(|&b| b == 0).unwrap_or(block.len());
        let text = String::from_utf8_lossy(&block[..end]);
        let mut lines = text.lines();

        let version = lines
            .next()
            .and_then(|line| line.split_whitespace().next())
            .ok_or_else(|| PanelcastError::handshake("missing protocol version line"))?;
        if version != PROTOCOL_VERSION {
            return Err(PanelcastError::Version {
                expected: PROTOCOL_VERSION.to_string(),
                found: version.to_string(),
            });
        }

        let aircraft =
            lines.next().ok_or_else(|| PanelcastError::handshake("missing aircraft line"))?;

        let texture_line =
            lines.next().ok_or_else(|| PanelcastError::handshake("missing texture size line"))?;
        let mut texture = texture_line.split_whitespace();
        let texture_width = parse_field(texture.next(), "texture width", texture_line)?;
        let texture_height = parse_field(texture.next(), "texture height", texture_line)?;

        let mut windows = Vec::new();
        let mut names = HashSet::new();
        for line in lines {
            if line.contains(END_MARKER) {
                break;
            }

            let window = parse_window(line)?;
            // Names come from a hand-edited host file; keep both and let the
            // index disambiguate
            if !names.insert(window.name.clone()) {
                warn!("Duplicate window name [{}] at index {}", window.name, windows.len());
            }

            debug!(
                "Window [{}] = ({},{})->({},{})",
                window.name,
                window.bounds.left,
                window.bounds.top,
                window.bounds.right,
                window.bounds.bottom
            );
            windows.push(window);
        }

        if windows.is_empty() {
            return Err(PanelcastError::handshake("no valid windows were sent"));
        }

        Ok(Self {
            version: version.to_string(),
            aircraft: aircraft.to_string(),
            texture_width,
            texture_height,
            windows,
        })
    }

    /// Number of advertised windows, never zero for a parsed session
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Window at `index` in host order
    pub fn window(&self, index: usize) -> Option<&WindowDescriptor> {
        self.windows.get(index)
    }

    /// Render this session as a host would send it.
    ///
    /// The text is NUL padded to [`HANDSHAKE_LEN`]. Fails if it does not fit
    /// with at least one terminating NUL.
    pub fn encode_block(&self) -> Result<Vec<u8>> {
        let mut text = format!(
            "{}\n{}\n{} {}\n",
            self.version, self.aircraft, self.texture_width, self.texture_height
        );
        for window in &self.windows {
            let b = &window.bounds;
            text.push_str(&format!(
                "{} {} {} {} {}\n",
                window.name, b.left, b.top, b.right, b.bottom
            ));
        }
        text.push_str(END_MARKER);
        text.push('\n');

        if text.len() >= HANDSHAKE_LEN {
            return Err(PanelcastError::handshake(format!(
                "handshake text is {} bytes, limit is {}",
                text.len(),
                HANDSHAKE_LEN - 1
            )));
        }

        let mut block = text.into_bytes();
        block.resize(HANDSHAKE_LEN, 0);
        Ok(block)
    }
}

fn parse_window(line: &str) -> Result<WindowDescriptor> {
    let mut fields = line.split_whitespace();
    let name = fields
        .next()
        .ok_or_else(|| PanelcastError::handshake("empty line in window list"))?
        .to_string();
    let left = parse_field(fields.next(), "window left", line)?;
    let top = parse_field(fields.next(), "window top", line)?;
    let right = parse_field(fields.next(), "window right", line)?;
    let bottom = parse_field(fields.next(), "window bottom", line)?;

    Ok(WindowDescriptor { name, bounds: WindowBounds { left, top, right, bottom } })
}

fn parse_field<T>(field: Option<&str>, what: &str, line: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let field =
        field.ok_or_else(|| PanelcastError::handshake(format!("missing {} in [{}]", what, line)))?;
    field.parse().map_err(|e| {
        PanelcastError::handshake(format!("invalid {} [{}] in [{}]: {}", what, field, line, e))
    })
}
