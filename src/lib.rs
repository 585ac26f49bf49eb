//! Camera Session Library
//!
//! A lifecycle manager for one camera hardware session. It binds a
//! vendor camera SDK to a host UI lifecycle it does not control,
//! turning the SDK's callback-driven events into a small reactive
//! state model with defined creation, pause/resume, and teardown
//! semantics.
//!
//! # Architecture
//!
//! ```text
//! host lifecycle signals → LifecycleBinder → CameraSession → camera SDK
//!                                                ↓
//!                      frame / result / error channels (UI thread)
//! ```
//!
//! # Design Principles
//!
//! - **No callback into a disposed context**: events in flight when a
//!   session is torn down are dropped, never delivered
//! - **No observer leaks**: each channel holds at most one subscriber,
//!   and disposal clears every slot
//! - **UI-affine delivery**: hardware threads never call subscriber
//!   code; everything is marshaled through the UI task queue
//! - **No retries**: permission and device failures are surfaced to
//!   the caller, who owns all retry decisions
//!
//! # Example
//!
//! ```
//! use camera_session::{
//!     AspectRatio, CameraMode, HostServices, LifecycleBinder, MockCamera, MockHost,
//!     UiExecutor,
//! };
//! use std::sync::{Arc, Weak};
//!
//! let (executor, ui) = UiExecutor::new();
//! let sdk = MockCamera::new();
//! let host: Arc<dyn HostServices> = Arc::new(MockHost::new(true));
//! let host_ref: Weak<dyn HostServices> = Arc::downgrade(&host);
//!
//! let mut binder = LifecycleBinder::new(Arc::new(sdk.clone()), host_ref, ui);
//! binder.on_create();
//! binder.on_start();
//! binder
//!     .initialize(CameraMode::BarcodeScan, AspectRatio::Square, false)
//!     .unwrap();
//! executor.drain(); // runs the scheduled camera start
//!
//! let session = binder.session().unwrap();
//! session.subscribe_results(|decoded| {
//!     if let Some(text) = decoded {
//!         println!("decoded: {text}");
//!     }
//! });
//!
//! // The SDK pushes events from its own threads; the executor
//! // delivers them on the UI thread.
//! sdk.emit_frame(Some(sdk.synthesize_frame(8, 8)), Some("ABC123".into()));
//! executor.drain();
//!
//! binder.on_destroy(true);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod dispatch;
pub mod hardware;
pub mod lifecycle;
pub mod metrics;
pub mod session;

// Re-export commonly used types at crate root
pub use dispatch::{UiExecutor, UiHandle};
pub use hardware::{
    AspectRatio, CameraCallback, CameraFault, CameraHandle, CameraMode, CameraParameters,
    CameraSdk, FaultKind, Frame, HardwareError, MockCamera,
};
pub use lifecycle::{BinderError, HostServices, LifecycleBinder, MockHost};
pub use metrics::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use metrics::{MetricsServer, MetricsServerConfig, ServerError};
pub use session::{
    CameraSession, ConfigError, FileConfig, OutputConfig, SessionConfig, SessionError,
    SessionState, SessionStats, Subscription,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
