//! Traits and types describing the vendor SDK surface.
//!
//! The session layer only ever talks to the sensor through these
//! traits. The SDK owns its capture and decoding threads; it reports
//! back exclusively through [`CameraCallback`], which may be invoked
//! from any thread.

use super::Frame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced across the SDK boundary.
#[derive(Debug, Clone, Error)]
pub enum HardwareError {
    #[error("camera permission not granted")]
    PermissionDenied,
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to capture still image: {0}")]
    CaptureFailed(String),
}

/// Camera operating mode selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraMode {
    /// Live preview stream only.
    Preview,
    /// Preview stream with barcode decoding enabled.
    BarcodeScan,
    /// Still-capture oriented stream.
    Capture,
}

/// Preview aspect ratio selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AspectRatio {
    /// 1:1.
    Square,
    /// 3:4.
    ThreeByFour,
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraMode::Preview => write!(f, "preview"),
            CameraMode::BarcodeScan => write!(f, "barcode-scan"),
            CameraMode::Capture => write!(f, "capture"),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatio::Square => write!(f, "1:1"),
            AspectRatio::ThreeByFour => write!(f, "3:4"),
        }
    }
}

/// Parameters applied to the sensor at open time.
#[derive(Debug, Clone, Copy)]
pub struct CameraParameters {
    /// Operating mode.
    pub mode: CameraMode,
    /// Preview aspect ratio.
    pub aspect_ratio: AspectRatio,
}

/// Classification of faults reported on the error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A frame could not be decoded; the stream continues.
    Decode,
    /// The sensor reported a device-level problem.
    Device,
    /// Anything the SDK could not classify.
    Internal,
}

/// A non-fatal fault delivered to error-channel subscribers.
#[derive(Debug, Clone)]
pub struct CameraFault {
    /// Fault classification.
    pub kind: FaultKind,
    /// SDK-supplied detail text.
    pub detail: String,
}

impl CameraFault {
    /// Creates a fault event.
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for CameraFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FaultKind::Decode => write!(f, "decode fault: {}", self.detail),
            FaultKind::Device => write!(f, "device fault: {}", self.detail),
            FaultKind::Internal => write!(f, "internal fault: {}", self.detail),
        }
    }
}

/// Push-based callback registered with the SDK at open time.
///
/// The SDK invokes exactly one of the two methods per event, on an
/// unspecified thread. Implementations must not block and must not
/// assume any particular calling context.
pub trait CameraCallback: Send + Sync {
    /// A frame was produced. `frame` is absent when only decode output
    /// is available; `decoded` is absent when nothing was decoded.
    /// Both may be absent on the same invocation.
    fn on_frame(&self, frame: Option<Frame>, decoded: Option<String>);

    /// The SDK hit a non-fatal problem.
    fn on_error(&self, kind: FaultKind, detail: String);
}

/// Factory side of the SDK boundary.
pub trait CameraSdk: Send + Sync {
    /// Opens the sensor, applying `params` and registering `callback`
    /// for push events. The returned handle exclusively owns the open
    /// sensor until [`CameraHandle::close`] is called or the handle is
    /// dropped.
    fn open(
        &self,
        params: &CameraParameters,
        callback: Arc<dyn CameraCallback>,
    ) -> Result<Box<dyn CameraHandle>, HardwareError>;
}

/// A live camera opened through [`CameraSdk::open`].
pub trait CameraHandle: Send {
    /// Disengages the stream without releasing the sensor.
    fn suspend(&mut self);

    /// Re-engages a suspended stream.
    fn resume(&mut self);

    /// Sets the zoom level. Out-of-range values are clamped by the SDK.
    fn set_zoom(&mut self, level: f32);

    /// Returns the current zoom level.
    fn zoom(&self) -> f32;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> f32;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> f32;

    /// Turns the flash on or off.
    fn set_flash(&mut self, enabled: bool);

    /// Returns whether the flash is currently on.
    fn flash(&self) -> bool;

    /// Captures a single still image and returns its encoded bytes.
    fn capture_still(&mut self) -> Result<Vec<u8>, HardwareError>;

    /// Releases the sensor. Further calls on the handle are no-ops.
    fn close(&mut self);
}
