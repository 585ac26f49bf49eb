//! Prometheus metrics exporter for session monitoring.
//!
//! Observability into the session lifecycle and event routing:
//!
//! - `camera_session_state` - lifecycle state
//!   (0=uninitialized, 1=active, 2=paused, 3=disposed)
//! - `camera_session_frames_published_total` - frame-channel publications
//! - `camera_session_results_published_total` - result-channel publications
//! - `camera_session_errors_published_total` - error-channel publications
//! - `camera_session_events_dropped_total` - events discarded after disposal
//!
//! The registry is always available; the HTTP exporter is compiled in
//! with the `metrics` cargo feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
