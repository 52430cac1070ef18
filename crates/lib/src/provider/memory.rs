//! In-memory auth provider.
//!
//! Holds a payload and a user record in process memory and applies updates
//! to that record with the same path semantics the store uses for its
//! optimistic view. Fetch and update latencies can be scripted per call,
//! which makes out-of-order completions reproducible under a paused tokio
//! clock.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use super::{
    AuthProvider, EventHandler, FetchedUser, JwtPayload, Patch, PersistUser, ProviderError,
};
use crate::{
    Result,
    path::{PropertyPath, set_path},
};

/// Cheap-to-clone handle to an in-memory session.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    payload: Mutex<Option<JwtPayload>>,
    user: Mutex<Option<Value>>,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    fetch_delays: Mutex<VecDeque<Duration>>,
    update_delays: Mutex<VecDeque<Duration>>,
    fail_updates: AtomicBool,
    fetch_count: AtomicUsize,
    received_patches: Mutex<Vec<Patch>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with a logged-in session.
    pub fn with_session(payload: JwtPayload, user: Value) -> Self {
        let provider = Self::new();
        provider.set_payload(Some(payload));
        provider.set_user(Some(user));
        provider
    }

    pub fn set_payload(&self, payload: Option<JwtPayload>) {
        *lock(&self.inner.payload) = payload;
    }

    pub fn set_user(&self, user: Option<Value>) {
        *lock(&self.inner.user) = user;
    }

    /// The record as the provider currently stores it.
    pub fn user(&self) -> Option<Value> {
        lock(&self.inner.user).clone()
    }

    /// Clears payload and user, then emits `logout`.
    pub fn logout(&self) {
        self.set_payload(None);
        self.set_user(None);
        self.emit(crate::constants::EVENT_LOGOUT);
    }

    /// Delay the next `get_user` call; queued delays are consumed in order.
    pub fn push_fetch_delay(&self, delay: Duration) {
        lock(&self.inner.fetch_delays).push_back(delay);
    }

    /// Delay the next `update` call; queued delays are consumed in order.
    pub fn push_update_delay(&self, delay: Duration) {
        lock(&self.inner.update_delays).push_back(delay);
    }

    /// Make every subsequent `update` call fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.inner.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Invoke all handlers registered for `event`.
    pub fn emit(&self, event: &str) {
        let handlers = lock(&self.inner.handlers)
            .get(event)
            .cloned()
            .unwrap_or_default();
        trace!(event, handlers = handlers.len(), "Emitting provider event");
        for handler in handlers {
            handler();
        }
    }

    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        lock(&self.inner.handlers).get(event).map_or(0, Vec::len)
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetch_count.load(Ordering::SeqCst)
    }

    /// Patches received by `update`, in call order.
    pub fn received_patches(&self) -> Vec<Patch> {
        lock(&self.inner.received_patches).clone()
    }
}

#[async_trait]
impl AuthProvider for MemoryProvider {
    fn jwt_payload(&self) -> Option<JwtPayload> {
        lock(&self.inner.payload).clone()
    }

    async fn get_user(&self) -> Result<Option<FetchedUser>> {
        self.inner.fetch_count.fetch_add(1, Ordering::SeqCst);
        // The record is read when the call starts; a slow fetch returns what
        // was current back then.
        let record = lock(&self.inner.user).clone();
        let delay = lock(&self.inner.fetch_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let persist: Arc<dyn PersistUser> = Arc::new(self.clone());
        Ok(record.map(|record| FetchedUser::new(record, Some(persist))))
    }

    fn on(&self, event: &str, handler: EventHandler) {
        lock(&self.inner.handlers)
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }
}

#[async_trait]
impl PersistUser for MemoryProvider {
    async fn update(&self, patch: &Patch) -> Result<Option<Value>> {
        lock(&self.inner.received_patches).push(patch.clone());
        let delay = lock(&self.inner.update_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.fail_updates.load(Ordering::SeqCst) {
            return Err(ProviderError::PersistFailed {
                reason: "update rejected by in-memory provider".to_string(),
            }
            .into());
        }

        let mut user = lock(&self.inner.user);
        let Some(record) = user.as_mut() else {
            return Ok(None);
        };
        for (path, value) in patch {
            let path = PropertyPath::parse(path).map_err(|e| ProviderError::InvalidResponse {
                reason: e.to_string(),
            })?;
            set_path(record, &path, value.clone());
        }
        Ok(Some(record.clone()))
    }
}
