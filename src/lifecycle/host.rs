//! Host context surface.
//!
//! The binder never owns the host UI context; it holds a non-owning
//! handle and checks liveness before every dispatch. Permission
//! requests are asynchronous: the host answers later through
//! [`LifecycleBinder::on_permission_result`] carrying the request id.
//!
//! [`LifecycleBinder::on_permission_result`]: crate::lifecycle::LifecycleBinder::on_permission_result

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Services the host UI context provides to the binder.
pub trait HostServices: Send + Sync {
    /// Returns whether camera permission is currently granted.
    fn permission_granted(&self) -> bool;

    /// Asks the host to show its permission request flow. The outcome
    /// arrives out-of-band, tagged with `request_id`.
    fn request_permission(&self, request_id: u32);
}

/// Host double for tests and the demo binary.
///
/// Permission state is a toggle; issued request ids are recorded so
/// callers can answer them.
#[derive(Default)]
pub struct MockHost {
    granted: AtomicBool,
    requests: Mutex<Vec<u32>>,
}

impl MockHost {
    /// Creates a host with the given initial permission state.
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Flips the permission state, as the platform would after the
    /// user answers the dialog.
    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    /// Returns every request id issued so far.
    pub fn requests(&self) -> Vec<u32> {
        self.requests.lock().clone()
    }
}

impl HostServices for MockHost {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_permission(&self, request_id: u32) {
        tracing::debug!(request_id, "permission requested");
        self.requests.lock().push(request_id);
    }
}
