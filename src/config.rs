//! Client configuration
//!
//! Plain values handed to the client by the embedding application. They can
//! be built in code or loaded from YAML:
//!
//! ```yaml
//! host: 192.168.1.20
//! port: 52500
//! initial_window: 2
//! display:
//!   geometry:
//!     width: 800
//!     height: 480
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_PORT;
use crate::{PanelcastError, Result};

/// How frames are sized for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Natural size until laid out, then follow the window size
    #[default]
    Windowed,
    /// Always scale to the screen
    Fullscreen,
    /// Always scale to a fixed size
    Geometry { width: u32, height: u32 },
}

/// Connection and display settings for a [`StreamClient`](crate::StreamClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Host running the simulator plugin
    pub host: String,

    /// Plugin TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Window to show first; negative, missing or out of range selects window 0
    #[serde(default)]
    pub initial_window: Option<i64>,

    /// Frame sizing; `fullscreen` or a `geometry` map in YAML
    #[serde(default, with = "serde_yaml_ng::with::singleton_map")]
    pub display: DisplayMode,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ClientConfig {
    /// Config for `host` on the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            initial_window: None,
            display: DisplayMode::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_initial_window(mut self, index: i64) -> Self {
        self.initial_window = Some(index);
        self
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| PanelcastError::config(format!("YAML parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            PanelcastError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values that could never produce a working client
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PanelcastError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(PanelcastError::config("port must not be 0"));
        }
        if let DisplayMode::Geometry { width, height } = self.display {
            if width == 0 || height == 0 {
                return Err(PanelcastError::config(format!(
                    "display geometry {}x{} has a zero dimension",
                    width, height
                )));
            }
        }
        Ok(())
    }

    /// `host:port` for diagnostics and connecting
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
