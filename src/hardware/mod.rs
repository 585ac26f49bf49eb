//! Vendor camera SDK boundary.
//!
//! This module defines the abstract surface the session layer drives:
//! a factory that opens the sensor ([`CameraSdk`]), a live handle for
//! stream and parameter control ([`CameraHandle`]), and the push-based
//! callback the SDK invokes from its own threads ([`CameraCallback`]).
//! A mock implementation is provided for tests and the demo binary.

mod frame;
mod mock;
mod sdk;

pub use frame::Frame;
pub use mock::MockCamera;
pub use sdk::{
    AspectRatio, CameraCallback, CameraFault, CameraHandle, CameraMode, CameraParameters,
    CameraSdk, FaultKind, HardwareError,
};
