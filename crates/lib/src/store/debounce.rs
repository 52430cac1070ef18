//! Trailing-edge debouncer backed by a tokio timer task.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};

use super::StoreError;

/// Runs a job once a quiet period has passed since the last `schedule` call.
///
/// Each call to [`Debouncer::schedule`] replaces the previous timer. When a
/// timer fires, the job is spawned as its own task, so cancelling or
/// rescheduling never interrupts a job that has already started.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer: Mutex::new(None),
        }
    }

    /// Restart the quiet period; `job` runs when it elapses.
    ///
    /// Fails when called outside a tokio runtime.
    pub fn schedule<F, Fut>(&self, job: F) -> Result<(), StoreError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime {
            task: "debounced flush",
        })?;
        let delay = self.delay;

        let mut timer = self.lock_timer();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(job());
        }));
        Ok(())
    }

    /// Cancel the waiting timer, if any. Returns whether one was waiting.
    pub fn cancel_pending(&self) -> bool {
        match self.lock_timer().take() {
            Some(timer) => {
                let waiting = !timer.is_finished();
                timer.abort();
                waiting
            }
            None => false,
        }
    }

    /// Whether a timer is currently waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
