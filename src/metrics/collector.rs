//! Metrics collection and registry.

use crate::session::{CameraSession, SessionState};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for a metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Session lifecycle state as a numeric code
    /// (0=uninitialized, 1=active, 2=paused, 3=disposed).
    pub state_code: i64,
    /// Total frame-channel publications.
    pub frames_published: u64,
    /// Total result-channel publications.
    pub results_published: u64,
    /// Total error-channel publications.
    pub errors_published: u64,
    /// Total events discarded because they arrived after disposal.
    pub dropped_after_dispose: u64,
}

impl MetricsSnapshot {
    /// Builds a snapshot from a live session.
    pub fn from_session(session: &CameraSession) -> Self {
        let stats = session.stats();
        Self {
            state_code: state_code(session.state()),
            frames_published: stats.frames_published,
            results_published: stats.results_published,
            errors_published: stats.errors_published,
            dropped_after_dispose: stats.dropped_after_dispose,
        }
    }
}

fn state_code(state: SessionState) -> i64 {
    match state {
        SessionState::Uninitialized => 0,
        SessionState::Active => 1,
        SessionState::Paused => 2,
        SessionState::Disposed => 3,
    }
}

/// Prometheus metrics registry for camera session monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    session_state: IntGauge,
    frames_total: IntCounter,
    results_total: IntCounter,
    errors_total: IntCounter,
    dropped_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all session metrics
    /// registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_state = IntGauge::new(
            "camera_session_state",
            "Session lifecycle state (0=uninitialized, 1=active, 2=paused, 3=disposed)",
        )?;
        let frames_total = IntCounter::new(
            "camera_session_frames_published_total",
            "Total frames offered on the frame channel",
        )?;
        let results_total = IntCounter::new(
            "camera_session_results_published_total",
            "Total decode results offered on the result channel",
        )?;
        let errors_total = IntCounter::new(
            "camera_session_errors_published_total",
            "Total faults offered on the error channel",
        )?;
        let dropped_total = IntCounter::new(
            "camera_session_events_dropped_total",
            "Total events discarded after session disposal",
        )?;

        registry.register(Box::new(session_state.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(results_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(dropped_total.clone()))?;

        Ok(Self {
            registry,
            session_state,
            frames_total,
            results_total,
            errors_total,
            dropped_total,
        })
    }

    /// Updates all metrics from a snapshot. Counters advance by the
    /// delta against their previously recorded totals.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_state.set(snapshot.state_code);

        advance(&self.frames_total, snapshot.frames_published);
        advance(&self.results_total, snapshot.results_published);
        advance(&self.errors_total, snapshot.errors_published);
        advance(&self.dropped_total, snapshot.dropped_after_dispose);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
