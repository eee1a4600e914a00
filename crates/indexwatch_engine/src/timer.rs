use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use watch_logging::watch_error;

/// A one-shot timer task that can be replaced or cleared.
///
/// Replacing or clearing aborts the previous task, so at most one firing is
/// ever outstanding per slot.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub(crate) fn replace<F>(&mut self, runtime: &Handle, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.clear();
        self.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire();
        }));
    }

    pub(crate) fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        watch_error!("recovering state from a poisoned lock");
        poisoned.into_inner()
    })
}
