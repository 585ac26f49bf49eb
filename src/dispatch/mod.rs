//! UI-affine task execution.
//!
//! All session state transitions and subscriber deliveries happen on a
//! single cooperative thread, mirroring a platform UI thread. This
//! module models that thread as an explicit FIFO task queue: hardware
//! callbacks post work through a cloneable [`UiHandle`], and whoever
//! owns the [`UiExecutor`] runs it.

mod executor;

pub use executor::{UiExecutor, UiHandle};
