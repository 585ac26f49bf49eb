//! FIFO task queue standing in for the host UI thread.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

type Task = Box<dyn FnOnce() + Send>;

/// Cloneable posting side of the UI queue.
///
/// `post` never blocks. Tasks posted after the executor is gone are
/// silently dropped, the same way work posted to a dead UI thread is.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<Task>,
}

impl UiHandle {
    /// Enqueues `task` for execution on the UI thread.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            tracing::trace!("ui executor gone, dropping task");
        }
    }
}

/// Owning side of the UI queue.
///
/// Tests call [`drain`] from the test thread, which thereby *is* the
/// UI thread. The demo binary parks in [`run_while`] instead.
///
/// [`drain`]: UiExecutor::drain
/// [`run_while`]: UiExecutor::run_while
pub struct UiExecutor {
    rx: Receiver<Task>,
}

impl UiExecutor {
    /// Creates a queue and its posting handle.
    pub fn new() -> (UiExecutor, UiHandle) {
        let (tx, rx) = unbounded();
        (UiExecutor { rx }, UiHandle { tx })
    }

    /// Runs every task currently queued, in posting order, and returns
    /// how many ran. Tasks posted while draining are run too.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Runs tasks until `keep_running` is cleared or every posting
    /// handle has been dropped.
    pub fn run_while(&self, keep_running: &AtomicBool) {
        while keep_running.load(Ordering::Relaxed) {
            match self.rx.recv_timeout(Duration::from_millis(50)) {
                Ok(task) => task(),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_tasks_run_in_posting_order() {
        let (executor, handle) = UiExecutor::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            handle.post(move || order.lock().unwrap().push(i));
        }

        assert_eq!(executor.drain(), 5);
        assert_eq!(order.lock().unwrap().as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_drain_empty_queue() {
        let (executor, _handle) = UiExecutor::new();
        assert_eq!(executor.drain(), 0);
    }

    #[test]
    fn test_post_after_executor_dropped() {
        let (executor, handle) = UiExecutor::new();
        drop(executor);

        // Must not panic.
        handle.post(|| unreachable!());
    }

    #[test]
    fn test_run_while_stops_on_disconnect() {
        let (executor, handle) = UiExecutor::new();
        let ran = Arc::new(Mutex::new(false));
        {
            let ran = Arc::clone(&ran);
            handle.post(move || *ran.lock().unwrap() = true);
        }
        drop(handle);

        let keep_running = AtomicBool::new(true);
        executor.run_while(&keep_running);
        assert!(*ran.lock().unwrap());
    }
}
