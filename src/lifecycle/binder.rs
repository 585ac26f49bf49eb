//! Host lifecycle to camera session glue.

use super::host::HostServices;
use crate::dispatch::UiHandle;
use crate::hardware::{AspectRatio, CameraMode, CameraSdk, FaultKind};
use crate::session::{CameraSession, SessionConfig, SessionError};
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Errors returned by binder operations.
#[derive(Debug, Error)]
pub enum BinderError {
    /// The host context went away; nothing can be dispatched to it.
    #[error("host context is no longer attached")]
    HostDetached,
    /// A session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Maps host lifecycle signals onto camera session operations.
///
/// One binder serves one host context and holds at most one session at
/// a time. The host is referenced weakly: the binder checks that the
/// context is still alive before each dispatch and never keeps it from
/// being torn down.
///
/// Lifecycle signals (`on_create` through `on_destroy`) and the
/// caller-facing operations are all expected on the UI-affine thread.
pub struct LifecycleBinder {
    sdk: Arc<dyn CameraSdk>,
    host: Weak<dyn HostServices>,
    ui: UiHandle,
    session: Option<CameraSession>,
    /// An `initialize` request waiting for a permission grant.
    start_pending: bool,
    outstanding_request: Option<u32>,
    next_request_id: u32,
    view_attached: bool,
}

impl LifecycleBinder {
    /// Creates a binder for one host context.
    pub fn new(sdk: Arc<dyn CameraSdk>, host: Weak<dyn HostServices>, ui: UiHandle) -> Self {
        Self {
            sdk,
            host,
            ui,
            session: None,
            start_pending: false,
            outstanding_request: None,
            next_request_id: 50,
            view_attached: false,
        }
    }

    /// Host signal: the activity was created. Allocates UI resources;
    /// the camera stays untouched.
    pub fn on_create(&mut self) {
        self.view_attached = true;
        tracing::debug!("host created, view attached");
    }

    /// Host signal: the activity became visible. Kicks off a
    /// permission request when access is not yet granted.
    pub fn on_start(&mut self) {
        tracing::debug!("host started");
        let host = match self.host.upgrade() {
            Some(host) => host,
            None => return,
        };
        if !host.permission_granted() && self.outstanding_request.is_none() {
            self.request_permission(&*host);
        }
    }

    /// Host signal: the activity came to the foreground.
    pub fn on_resume(&mut self) {
        tracing::debug!("host resumed");
        if let Some(session) = &self.session {
            if let Err(e) = session.resume() {
                // Expected when signals arrive before initialization
                // finishes; the host ordering is not ours to control.
                tracing::debug!(error = %e, "resume signal ignored");
            }
        }
    }

    /// Host signal: the activity left the foreground.
    pub fn on_pause(&mut self) {
        tracing::debug!("host paused");
        if let Some(session) = &self.session {
            session.pause();
        }
    }

    /// Host signal: the activity is no longer visible.
    pub fn on_stop(&mut self) {
        tracing::debug!("host stopped");
        if let Some(session) = &self.session {
            session.pause();
        }
    }

    /// Host signal: the activity is being destroyed. A configuration
    /// change (`finishing == false`) only pauses the stream; a final
    /// destroy tears the session down.
    pub fn on_destroy(&mut self, finishing: bool) {
        tracing::debug!(finishing, "host destroyed");
        if finishing {
            self.dispose();
        } else if let Some(session) = &self.session {
            session.pause();
        }
    }

    /// Delivers the host's answer to a permission request. The id must
    /// match the outstanding request; anything else is stale and
    /// ignored. On grant, a waiting `initialize` proceeds to start the
    /// camera; a denial keeps it waiting for a later grant.
    pub fn on_permission_result(&mut self, request_id: u32, granted: bool) {
        match self.outstanding_request {
            Some(id) if id == request_id => self.outstanding_request = None,
            _ => {
                tracing::warn!(request_id, "ignoring unmatched permission result");
                return;
            }
        }
        if granted {
            tracing::info!("camera permission granted");
            if self.start_pending {
                self.schedule_start();
            }
        } else {
            tracing::warn!("camera permission denied");
        }
    }

    /// Caller operation: create and start a session with the given
    /// settings.
    ///
    /// Any existing session is disposed and replaced. When permission
    /// is already granted the camera start is scheduled on the UI
    /// queue (hardware initialization never runs on an arbitrary
    /// caller thread); otherwise the request is parked until a grant
    /// arrives via [`on_permission_result`].
    ///
    /// [`on_permission_result`]: LifecycleBinder::on_permission_result
    pub fn initialize(
        &mut self,
        mode: CameraMode,
        ratio: AspectRatio,
        flash_enabled: bool,
    ) -> Result<(), BinderError> {
        let host = self.host.upgrade().ok_or(BinderError::HostDetached)?;

        if let Some(previous) = self.session.take() {
            tracing::debug!("replacing existing camera session");
            previous.dispose();
        }

        let config = SessionConfig::new(mode, ratio, flash_enabled);
        self.session = Some(CameraSession::new(config, self.ui.clone()));
        self.start_pending = true;
        tracing::info!(mode = %mode, ratio = %ratio, flash = flash_enabled, "initialize requested");

        if host.permission_granted() {
            self.schedule_start();
        } else if self.outstanding_request.is_none() {
            self.request_permission(&*host);
        }
        Ok(())
    }

    /// Caller operation: tear everything down. Safe to call even when
    /// `initialize` never ran.
    pub fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            session.dispose();
        }
        self.start_pending = false;
        self.outstanding_request = None;
        self.view_attached = false;
        tracing::debug!("binder disposed");
    }

    /// Returns the current session, if one was initialized. Callers
    /// subscribe to event channels through this.
    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    /// Returns whether UI resources are currently attached.
    pub fn view_attached(&self) -> bool {
        self.view_attached
    }

    /// Caller operation: capture a still image.
    pub fn take_picture(&self) -> Result<Vec<u8>, SessionError> {
        self.live_session()?.take_picture()
    }

    /// Caller operation: set the zoom level.
    pub fn set_zoom_level(&self, level: f32) -> Result<(), SessionError> {
        self.live_session()?.set_zoom(level)
    }

    /// Caller operation: current zoom level.
    pub fn current_zoom_level(&self) -> Result<f32, SessionError> {
        self.live_session()?.zoom()
    }

    /// Caller operation: minimum zoom level.
    pub fn minimum_zoom_level(&self) -> Result<f32, SessionError> {
        self.live_session()?.min_zoom()
    }

    /// Caller operation: maximum zoom level.
    pub fn maximum_zoom_level(&self) -> Result<f32, SessionError> {
        self.live_session()?.max_zoom()
    }

    /// Caller operation: turn the flash on or off.
    pub fn set_flash_status(&self, enabled: bool) -> Result<(), SessionError> {
        self.live_session()?.set_flash(enabled)
    }

    /// Caller operation: current flash state.
    pub fn flash_status(&self) -> Result<bool, SessionError> {
        self.live_session()?.flash()
    }

    fn live_session(&self) -> Result<&CameraSession, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotInitialized)
    }

    fn request_permission(&mut self, host: &dyn HostServices) {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.outstanding_request = Some(request_id);
        host.request_permission(request_id);
    }

    fn schedule_start(&mut self) {
        self.start_pending = false;
        let session = match self.session.clone() {
            Some(session) => session,
            None => return,
        };
        let sdk = Arc::clone(&self.sdk);
        self.ui.post(move || {
            if let Err(e) = session.start(sdk.as_ref()) {
                tracing::error!(error = %e, "camera start failed");
                // Start ran detached from the caller, so the failure
                // has to surface where subscribers can see it.
                session.publish_fault(FaultKind::Device, e.to_string());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::UiExecutor;
    use crate::hardware::{HardwareError, MockCamera};
    use crate::lifecycle::MockHost;
    use crate::session::SessionState;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn binder_with(
        granted: bool,
    ) -> (UiExecutor, MockCamera, Arc<MockHost>, LifecycleBinder) {
        let (executor, ui) = UiExecutor::new();
        let sdk = MockCamera::new();
        let host = Arc::new(MockHost::new(granted));
        let host_dyn: Arc<dyn HostServices> = host.clone();
        let host_ref: Weak<dyn HostServices> = Arc::downgrade(&host_dyn);
        let binder = LifecycleBinder::new(Arc::new(sdk.clone()), host_ref, ui);
        (executor, sdk, host, binder)
    }

    #[test]
    fn test_initialize_with_permission_granted() {
        let (executor, sdk, _host, mut binder) = binder_with(true);

        binder.on_create();
        binder.on_start();
        binder
            .initialize(CameraMode::BarcodeScan, AspectRatio::Square, true)
            .unwrap();

        // The start runs on the UI queue, not inline.
        assert_eq!(binder.session().unwrap().state(), SessionState::Uninitialized);
        executor.drain();

        assert_eq!(binder.session().unwrap().state(), SessionState::Active);
        assert!(sdk.is_open());
        assert!(sdk.flash());
    }

    #[test]
    fn test_initialize_waits_for_permission() {
        let (executor, sdk, host, mut binder) = binder_with(false);

        binder.on_create();
        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        executor.drain();

        // Nothing starts while permission is missing.
        assert_eq!(binder.session().unwrap().state(), SessionState::Uninitialized);
        assert!(!sdk.is_open());
        let requests = host.requests();
        assert_eq!(requests.len(), 1);

        // The grant completes the original request; no second
        // initialize call is needed.
        host.set_granted(true);
        binder.on_permission_result(requests[0], true);
        executor.drain();

        assert_eq!(binder.session().unwrap().state(), SessionState::Active);
        assert!(sdk.is_open());
    }

    #[test]
    fn test_denied_then_granted() {
        let (executor, sdk, host, mut binder) = binder_with(false);

        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        let first = host.requests()[0];
        binder.on_permission_result(first, false);
        executor.drain();
        assert!(!sdk.is_open());

        // The host asks again on the next start signal.
        binder.on_start();
        let second = *host.requests().last().unwrap();
        assert_ne!(first, second);

        host.set_granted(true);
        binder.on_permission_result(second, true);
        executor.drain();
        assert_eq!(binder.session().unwrap().state(), SessionState::Active);
    }

    #[test]
    fn test_unmatched_permission_result_ignored() {
        let (executor, sdk, host, mut binder) = binder_with(false);

        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        let issued = host.requests()[0];

        host.set_granted(true);
        binder.on_permission_result(issued + 99, true);
        executor.drain();

        // A stale correlation must not start the camera.
        assert!(!sdk.is_open());
        assert_eq!(binder.session().unwrap().state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_lifecycle_signal_mapping() {
        let (executor, sdk, _host, mut binder) = binder_with(true);

        binder.on_create();
        assert!(binder.view_attached());
        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        executor.drain();
        assert_eq!(binder.session().unwrap().state(), SessionState::Active);

        binder.on_pause();
        assert_eq!(binder.session().unwrap().state(), SessionState::Paused);
        assert!(sdk.is_suspended());

        binder.on_resume();
        assert_eq!(binder.session().unwrap().state(), SessionState::Active);

        binder.on_stop();
        assert_eq!(binder.session().unwrap().state(), SessionState::Paused);

        // A configuration-change destroy keeps the session alive.
        binder.on_destroy(false);
        assert_eq!(binder.session().unwrap().state(), SessionState::Paused);

        binder.on_destroy(true);
        assert!(binder.session().is_none());
        assert!(!binder.view_attached());
        assert!(!sdk.is_open());
    }

    #[test]
    fn test_signals_before_initialize_are_noops() {
        let (_executor, _sdk, _host, mut binder) = binder_with(true);

        binder.on_resume();
        binder.on_pause();
        binder.on_stop();
        binder.on_destroy(true);
        binder.dispose();

        assert!(binder.session().is_none());
    }

    #[test]
    fn test_operations_before_initialize() {
        let (_executor, _sdk, _host, binder) = binder_with(true);

        assert!(matches!(binder.take_picture(), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.set_zoom_level(2.0), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.current_zoom_level(), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.minimum_zoom_level(), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.maximum_zoom_level(), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.set_flash_status(true), Err(SessionError::NotInitialized)));
        assert!(matches!(binder.flash_status(), Err(SessionError::NotInitialized)));
    }

    #[test]
    fn test_operations_after_start() {
        let (executor, sdk, _host, mut binder) = binder_with(true);

        binder
            .initialize(CameraMode::Capture, AspectRatio::ThreeByFour, false)
            .unwrap();
        executor.drain();

        binder.set_zoom_level(4.0).unwrap();
        assert_eq!(binder.current_zoom_level().unwrap(), 4.0);
        assert_eq!(binder.minimum_zoom_level().unwrap(), 1.0);
        assert_eq!(binder.maximum_zoom_level().unwrap(), 8.0);

        binder.set_flash_status(true).unwrap();
        assert!(binder.flash_status().unwrap());

        sdk.set_still_bytes(vec![9, 9, 9]);
        assert_eq!(binder.take_picture().unwrap(), vec![9, 9, 9]);
    }

    #[test]
    fn test_initialize_replaces_existing_session() {
        let (executor, sdk, _host, mut binder) = binder_with(true);

        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        executor.drain();
        let first = binder.session().unwrap().clone();
        assert_eq!(first.state(), SessionState::Active);

        binder
            .initialize(CameraMode::BarcodeScan, AspectRatio::Square, false)
            .unwrap();
        executor.drain();

        // The old session is torn down, not leaked.
        assert_eq!(first.state(), SessionState::Disposed);
        assert_eq!(binder.session().unwrap().state(), SessionState::Active);
        assert_eq!(sdk.opens(), 2);
        assert_eq!(sdk.closes(), 1);
    }

    #[test]
    fn test_initialize_with_dead_host() {
        let (_executor, sdk, host, mut binder) = binder_with(true);
        drop(host);

        let result = binder.initialize(CameraMode::Preview, AspectRatio::Square, false);
        assert!(matches!(result, Err(BinderError::HostDetached)));
        assert!(!sdk.is_open());
    }

    #[test]
    fn test_scheduled_start_failure_hits_error_channel() {
        let (executor, sdk, _host, mut binder) = binder_with(true);
        sdk.reject_open(HardwareError::OpenFailed("sensor busy".into()));

        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();

        let faults = Arc::new(Mutex::new(Vec::new()));
        {
            let faults = Arc::clone(&faults);
            binder
                .session()
                .unwrap()
                .subscribe_errors(move |fault| faults.lock().push(fault.kind));
        }
        executor.drain();

        assert_eq!(faults.lock().as_slice(), &[FaultKind::Device]);
        assert_eq!(binder.session().unwrap().state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_dispose_clears_pending_start() {
        let (executor, sdk, host, mut binder) = binder_with(false);

        binder
            .initialize(CameraMode::Preview, AspectRatio::ThreeByFour, false)
            .unwrap();
        let issued = host.requests()[0];
        binder.dispose();

        // A grant that lands after teardown must not start anything.
        host.set_granted(true);
        binder.on_permission_result(issued, true);
        executor.drain();

        assert!(binder.session().is_none());
        assert!(!sdk.is_open());
    }

    #[test]
    fn test_frame_counting_through_binder() {
        let (executor, sdk, _host, mut binder) = binder_with(true);

        binder
            .initialize(CameraMode::BarcodeScan, AspectRatio::Square, false)
            .unwrap();
        executor.drain();

        let results = Arc::new(AtomicU32::new(0));
        {
            let results = Arc::clone(&results);
            binder.session().unwrap().subscribe_results(move |_| {
                results.fetch_add(1, Ordering::SeqCst);
            });
        }

        sdk.emit_frame(Some(sdk.synthesize_frame(8, 8)), Some("CODE".into()));
        executor.drain();
        assert_eq!(results.load(Ordering::SeqCst), 1);
    }
}
