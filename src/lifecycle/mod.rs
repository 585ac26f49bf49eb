//! Host lifecycle binding.
//!
//! [`LifecycleBinder`] receives the host activity's lifecycle signals
//! as explicit method calls, owns the permission handshake, and maps
//! everything onto the session state machine. It also exposes the
//! caller-facing operation surface the remote-call layer dispatches
//! into.

mod binder;
mod host;

pub use binder::{BinderError, LifecycleBinder};
pub use host::{HostServices, MockHost};
