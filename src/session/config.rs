//! Session configuration.
//!
//! A session's configuration is fixed when the session is created and
//! never changes afterward; runtime flash toggling goes through the
//! session operations, not through this type.

use crate::hardware::{AspectRatio, CameraMode, CameraParameters};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable configuration for one camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Camera operating mode.
    pub mode: CameraMode,
    /// Preview aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Whether the flash is turned on when the session starts.
    pub flash_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: CameraMode::Preview,
            aspect_ratio: AspectRatio::ThreeByFour,
            flash_enabled: false,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration from caller-supplied settings.
    pub fn new(mode: CameraMode, aspect_ratio: AspectRatio, flash_enabled: bool) -> Self {
        Self {
            mode,
            aspect_ratio,
            flash_enabled,
        }
    }

    /// Returns the hardware-level parameters applied at open time.
    ///
    /// The flash default is not part of the open parameters; it is
    /// applied through the handle once the sensor is open.
    pub fn parameters(&self) -> CameraParameters {
        CameraParameters {
            mode: self.mode,
            aspect_ratio: self.aspect_ratio,
        }
    }
}

/// Configuration file errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Demo output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Run continuously (true) or stop after `frame_count` frames.
    pub continuous: bool,
    /// Number of frames to deliver if not continuous.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 100,
            metrics_port: 9090,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }
}
