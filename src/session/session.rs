//! The camera session state machine.
//!
//! A [`CameraSession`] owns the hardware handle for one configured,
//! live binding to the camera and fans hardware events out to three
//! single-subscriber channels: frames, decoded results, and faults.
//!
//! # Threading
//!
//! Every state transition and every subscriber delivery happens on the
//! UI-affine thread (see [`crate::dispatch`]). The hardware SDK calls
//! back from its own threads; those callbacks only enqueue work. The
//! disposed-state check performed before each delivery runs under the
//! same lock the dispose transition takes, so an event in flight while
//! the session is torn down observes `Disposed` and is dropped instead
//! of delivered.

use super::config::SessionConfig;
use super::slot::Slot;
use crate::dispatch::UiHandle;
use crate::hardware::{
    CameraCallback, CameraFault, CameraHandle, CameraSdk, FaultKind, Frame, HardwareError,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Errors returned by session operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Camera access was refused. The caller must re-request permission
    /// and invoke initialization again; the core never retries.
    #[error("camera permission denied")]
    PermissionDenied,
    /// The sensor could not be opened. Terminal for this session
    /// instance; the caller must create a new session.
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The operation needs a started session.
    #[error("camera session not initialized")]
    NotInitialized,
    /// The operation is not legal in the current state.
    #[error("cannot {op} a {state:?} session")]
    InvalidTransition {
        /// Operation that was attempted.
        op: &'static str,
        /// State the session was in.
        state: SessionState,
    },
    /// A still capture failed. Per-call; the session stays usable.
    #[error("still capture failed: {0}")]
    CaptureFailed(String),
}

/// Lifecycle state of a [`CameraSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not started; no hardware handle.
    Uninitialized,
    /// Hardware open, stream engaged.
    Active,
    /// Hardware open, stream disengaged.
    Paused,
    /// Torn down. Terminal.
    Disposed,
}

/// Event delivery counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frame-channel publications.
    pub frames_published: u64,
    /// Result-channel publications (with or without decoded text).
    pub results_published: u64,
    /// Error-channel publications.
    pub errors_published: u64,
    /// Events discarded because they arrived after disposal.
    pub dropped_after_dispose: u64,
}

struct Shared {
    config: SessionConfig,
    state: SessionState,
    handle: Option<Box<dyn CameraHandle>>,
    frames: Slot<Frame>,
    results: Slot<Option<String>>,
    errors: Slot<CameraFault>,
    stats: SessionStats,
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Frames,
    Results,
    Errors,
}

/// Cancellation handle for one subscription.
///
/// Cancelling clears the channel's slot only if it still holds the
/// subscriber this handle was returned for; after a resubscribe the
/// older handle becomes inert. Dropping the handle without calling
/// [`cancel`](Subscription::cancel) leaves the subscriber installed.
pub struct Subscription {
    shared: Weak<Mutex<Shared>>,
    channel: Channel,
    generation: u64,
}

impl Subscription {
    /// Removes the subscriber, unless it was already replaced.
    pub fn cancel(self) {
        let shared = match self.shared.upgrade() {
            Some(shared) => shared,
            None => return,
        };
        let mut shared = shared.lock();
        let cleared = match self.channel {
            Channel::Frames => shared.frames.clear_if(self.generation),
            Channel::Results => shared.results.clear_if(self.generation),
            Channel::Errors => shared.errors.clear_if(self.generation),
        };
        if cleared {
            tracing::debug!(channel = ?self.channel, "subscriber removed");
        }
    }

    fn inert(channel: Channel) -> Self {
        Self {
            shared: Weak::new(),
            channel,
            generation: 0,
        }
    }
}

/// One configured, live binding to the camera hardware.
///
/// Cheap to clone; clones share state. All operations take `&self` and
/// are expected to be called on the UI-affine thread.
#[derive(Clone)]
pub struct CameraSession {
    shared: Arc<Mutex<Shared>>,
    ui: UiHandle,
}

impl CameraSession {
    /// Creates a session in the `Uninitialized` state. The
    /// configuration is fixed here and applied when [`start`] runs.
    ///
    /// [`start`]: CameraSession::start
    pub fn new(config: SessionConfig, ui: UiHandle) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                config,
                state: SessionState::Uninitialized,
                handle: None,
                frames: Slot::default(),
                results: Slot::default(),
                errors: Slot::default(),
                stats: SessionStats::default(),
            })),
            ui,
        }
    }

    /// Returns the session configuration.
    pub fn config(&self) -> SessionConfig {
        self.shared.lock().config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Returns a snapshot of the delivery counters.
    pub fn stats(&self) -> SessionStats {
        self.shared.lock().stats
    }

    /// Opens the sensor and engages the stream.
    ///
    /// Valid only from `Uninitialized`. Applies the configured flash
    /// default once the sensor is open. Must run on the UI-affine
    /// thread; the open call itself is expected to return promptly and
    /// stream results arrive later as events.
    pub fn start(&self, sdk: &dyn CameraSdk) -> Result<(), SessionError> {
        let mut shared = self.shared.lock();
        match shared.state {
            SessionState::Uninitialized => {}
            state => return Err(SessionError::InvalidTransition { op: "start", state }),
        }

        let bridge: Arc<dyn CameraCallback> = Arc::new(EventBridge {
            shared: Arc::downgrade(&self.shared),
            ui: self.ui.clone(),
        });
        let mut handle = sdk
            .open(&shared.config.parameters(), bridge)
            .map_err(|e| match e {
                HardwareError::PermissionDenied => SessionError::PermissionDenied,
                other => SessionError::DeviceUnavailable(other.to_string()),
            })?;
        handle.set_flash(shared.config.flash_enabled);

        shared.handle = Some(handle);
        shared.state = SessionState::Active;
        tracing::info!(
            mode = %shared.config.mode,
            ratio = %shared.config.aspect_ratio,
            flash = shared.config.flash_enabled,
            "camera session active"
        );
        Ok(())
    }

    /// Re-engages a paused stream. No-op when already `Active`.
    pub fn resume(&self) -> Result<(), SessionError> {
        let mut shared = self.shared.lock();
        match shared.state {
            SessionState::Active => Ok(()),
            SessionState::Paused => {
                if let Some(handle) = shared.handle.as_mut() {
                    handle.resume();
                }
                shared.state = SessionState::Active;
                tracing::debug!("camera session resumed");
                Ok(())
            }
            SessionState::Uninitialized | SessionState::Disposed => {
                Err(SessionError::NotInitialized)
            }
        }
    }

    /// Disengages the stream, keeping the sensor allocated.
    ///
    /// No-op from every state other than `Active`: host lifecycle
    /// signals arrive in unexpected orders during fast navigation, so
    /// pausing an unstarted or torn-down session must be harmless.
    pub fn pause(&self) {
        let mut shared = self.shared.lock();
        if shared.state == SessionState::Active {
            if let Some(handle) = shared.handle.as_mut() {
                handle.suspend();
            }
            shared.state = SessionState::Paused;
            tracing::debug!("camera session paused");
        }
    }

    /// Releases the sensor, clears every subscriber slot, and moves to
    /// `Disposed`. Idempotent. Safe to call while hardware callbacks
    /// are in flight; anything still queued is dropped on delivery.
    pub fn dispose(&self) {
        let mut shared = self.shared.lock();
        if shared.state == SessionState::Disposed {
            return;
        }
        if let Some(mut handle) = shared.handle.take() {
            handle.close();
        }
        shared.frames.clear();
        shared.results.clear();
        shared.errors.clear();
        shared.state = SessionState::Disposed;
        tracing::info!("camera session disposed");
    }

    /// Sets the zoom level.
    pub fn set_zoom(&self, level: f32) -> Result<(), SessionError> {
        self.with_live_handle(|h| h.set_zoom(level))
    }

    /// Returns the current zoom level.
    pub fn zoom(&self) -> Result<f32, SessionError> {
        self.with_live_handle(|h| h.zoom())
    }

    /// Returns the minimum supported zoom level.
    pub fn min_zoom(&self) -> Result<f32, SessionError> {
        self.with_live_handle(|h| h.min_zoom())
    }

    /// Returns the maximum supported zoom level.
    pub fn max_zoom(&self) -> Result<f32, SessionError> {
        self.with_live_handle(|h| h.max_zoom())
    }

    /// Turns the flash on or off.
    pub fn set_flash(&self, enabled: bool) -> Result<(), SessionError> {
        self.with_live_handle(|h| h.set_flash(enabled))
    }

    /// Returns whether the flash is on.
    pub fn flash(&self) -> Result<bool, SessionError> {
        self.with_live_handle(|h| h.flash())
    }

    /// Captures a still image and returns its encoded bytes.
    pub fn take_picture(&self) -> Result<Vec<u8>, SessionError> {
        self.with_live_handle(|h| h.capture_still())?
            .map_err(|e| SessionError::CaptureFailed(e.to_string()))
    }

    /// Installs `callback` as the frame-channel subscriber, replacing
    /// any current one.
    pub fn subscribe_frames(
        &self,
        callback: impl Fn(Frame) + Send + Sync + 'static,
    ) -> Subscription {
        let mut shared = self.shared.lock();
        if shared.state == SessionState::Disposed {
            return Subscription::inert(Channel::Frames);
        }
        let generation = shared.frames.install(Arc::new(callback));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            channel: Channel::Frames,
            generation,
        }
    }

    /// Installs `callback` as the result-channel subscriber. The
    /// payload is the decoded text, which may be absent: a result is
    /// published for every hardware frame event, image or not.
    pub fn subscribe_results(
        &self,
        callback: impl Fn(Option<String>) + Send + Sync + 'static,
    ) -> Subscription {
        let mut shared = self.shared.lock();
        if shared.state == SessionState::Disposed {
            return Subscription::inert(Channel::Results);
        }
        let generation = shared.results.install(Arc::new(callback));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            channel: Channel::Results,
            generation,
        }
    }

    /// Installs `callback` as the error-channel subscriber.
    pub fn subscribe_errors(
        &self,
        callback: impl Fn(CameraFault) + Send + Sync + 'static,
    ) -> Subscription {
        let mut shared = self.shared.lock();
        if shared.state == SessionState::Disposed {
            return Subscription::inert(Channel::Errors);
        }
        let generation = shared.errors.install(Arc::new(callback));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            channel: Channel::Errors,
            generation,
        }
    }

    /// Publishes a fault on the error channel from the UI thread.
    /// Used by the lifecycle layer for failures that occur outside the
    /// hardware callback path.
    pub(crate) fn publish_fault(&self, kind: FaultKind, detail: String) {
        deliver_error(&Arc::downgrade(&self.shared), CameraFault::new(kind, detail));
    }

    fn with_live_handle<R>(
        &self,
        op: impl FnOnce(&mut dyn CameraHandle) -> R,
    ) -> Result<R, SessionError> {
        let mut shared = self.shared.lock();
        match shared.state {
            SessionState::Active | SessionState::Paused => {}
            _ => return Err(SessionError::NotInitialized),
        }
        let handle = shared.handle.as_mut().ok_or(SessionError::NotInitialized)?;
        Ok(op(handle.as_mut()))
    }
}

/// Bridges SDK callbacks onto the UI queue.
///
/// Holds only a weak reference to the session so a disposed and
/// dropped session cannot be kept alive by a late hardware event.
struct EventBridge {
    shared: Weak<Mutex<Shared>>,
    ui: UiHandle,
}

impl CameraCallback for EventBridge {
    fn on_frame(&self, frame: Option<Frame>, decoded: Option<String>) {
        if let Some(frame) = frame {
            let shared = self.shared.clone();
            self.ui.post(move || deliver_frame(&shared, frame));
        }
        // The result is published even when no image came with it.
        // Frame and result publications are independent tasks, so a
        // subscriber can see a result without a matching frame.
        let shared = self.shared.clone();
        self.ui.post(move || deliver_result(&shared, decoded));
    }

    fn on_error(&self, kind: FaultKind, detail: String) {
        let shared = self.shared.clone();
        self.ui
            .post(move || deliver_error(&shared, CameraFault::new(kind, detail)));
    }
}

fn deliver_frame(shared: &Weak<Mutex<Shared>>, frame: Frame) {
    let shared = match shared.upgrade() {
        Some(shared) => shared,
        None => return,
    };
    let callback = {
        let mut shared = shared.lock();
        if shared.state == SessionState::Disposed {
            shared.stats.dropped_after_dispose += 1;
            tracing::trace!("dropping frame event for disposed session");
            return;
        }
        shared.stats.frames_published += 1;
        shared.frames.current()
    };
    // Dispose also runs on this thread, so the state checked above
    // still holds when the subscriber is invoked below.
    if let Some(callback) = callback {
        (*callback)(frame);
    }
}

fn deliver_result(shared: &Weak<Mutex<Shared>>, decoded: Option<String>) {
    let shared = match shared.upgrade() {
        Some(shared) => shared,
        None => return,
    };
    let callback = {
        let mut shared = shared.lock();
        if shared.state == SessionState::Disposed {
            shared.stats.dropped_after_dispose += 1;
            tracing::trace!("dropping result event for disposed session");
            return;
        }
        shared.stats.results_published += 1;
        shared.results.current()
    };
    if let Some(callback) = callback {
        (*callback)(decoded);
    }
}

fn deliver_error(shared: &Weak<Mutex<Shared>>, fault: CameraFault) {
    let shared = match shared.upgrade() {
        Some(shared) => shared,
        None => return,
    };
    let callback = {
        let mut shared = shared.lock();
        if shared.state == SessionState::Disposed {
            shared.stats.dropped_after_dispose += 1;
            tracing::trace!(fault = %fault, "dropping error event for disposed session");
            return;
        }
        shared.stats.errors_published += 1;
        shared.errors.current()
    };
    if let Some(callback) = callback {
        (*callback)(fault);
    }
}
