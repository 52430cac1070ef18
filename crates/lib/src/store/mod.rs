//! The auth/user sync store.
//!
//! [`AuthStore`] mirrors an [`AuthProvider`]'s session: it tracks the
//! authentication status and JWT payload, keeps the last server-confirmed user
//! record, and overlays a queue of optimistic edits on top of it. Observers
//! read the resulting [`AuthSnapshot`] through a `tokio::sync::watch` channel.
//!
//! Edits are persisted by a debounced flush that merges everything queued into
//! one patch. Two guards keep late responses from corrupting the view:
//!
//! - a fetched user is only applied if its `Uid` matches the subject of the
//!   payload current at completion time, otherwise the store resets;
//! - a persisted record is only applied if no newer flush was issued while it
//!   was in flight.
//!
//! Public operations never fail. Problems are logged and the last known good
//! state is kept; [`AuthStore::try_update_user`] exposes the rejection reason
//! for callers that want it.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    Result,
    access::{CompareFlags, toggle_in_list},
    clock::{Clock, SystemClock},
    config::StoreConfig,
    path::{PropertyPath, get_path},
    provider::{AuthProvider, FetchedUser, JwtPayload, Patch, PersistUser},
};

mod compute;
mod debounce;
mod errors;
mod events;
mod pending;
mod state;

pub use compute::compute_effective_user;
pub use debounce::Debouncer;
pub use errors::StoreError;
pub use pending::{PendingQueue, PendingUpdate};
pub use state::{AuthSnapshot, AuthStatus};

/// Mutable store state. Only ever touched under `StoreInner::state`.
#[derive(Default)]
struct StoreState {
    status: AuthStatus,
    payload: Option<JwtPayload>,
    server_user: Option<Value>,
    pending: PendingQueue,
    persist: Option<Arc<dyn PersistUser>>,
    /// Last issued flush request number; 0 when nothing is in flight.
    request_counter: u64,
    /// Advanced whenever user data is cleared. Work started in an older epoch
    /// is discarded.
    epoch: u64,
    /// Bumped whenever `server_user` or `pending` changes.
    revision: u64,
    effective_user: Option<Value>,
    effective_revision: u64,
    events_wired: bool,
    disposed: bool,
}

impl StoreState {
    fn clear_user_data(&mut self) {
        self.server_user = None;
        self.pending.clear();
        self.persist = None;
        self.request_counter = 0;
        self.revision += 1;
        self.epoch += 1;
    }

    fn reset(&mut self) {
        self.clear_user_data();
        self.status = AuthStatus::Pending;
        self.payload = None;
    }

    /// Recompute the effective user if its inputs changed since last time.
    fn refresh_effective_user(&mut self) {
        if self.revision != self.effective_revision {
            self.effective_user = compute_effective_user(self.server_user.as_ref(), &self.pending);
            self.effective_revision = self.revision;
        }
    }

    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            status: self.status,
            payload: self.payload.clone(),
            user: self.effective_user.clone(),
        }
    }
}

/// Diagnostic view of the state observers cannot see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugState {
    pub status: AuthStatus,
    pub has_server_user: bool,
    pub has_persist: bool,
    pub pending: usize,
    pub unclaimed: bool,
    pub request_counter: u64,
    pub epoch: u64,
    pub disposed: bool,
}

struct StoreInner {
    provider: Option<Arc<dyn AuthProvider>>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
    updates: watch::Sender<AuthSnapshot>,
    debouncer: Debouncer,
}

/// How a single sync attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Unavailable,
    Anonymous,
    Applied,
    /// The fetched user does not belong to the current session.
    Mismatch,
    /// A reset happened while the fetch was in flight.
    Superseded,
    Failed,
}

/// Handle to an auth store. Clones share the same state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<StoreInner>,
}

/// Weak handle to an [`AuthStore`].
///
/// Provider event handlers and the flush timer hold this instead of a strong
/// handle so that neither keeps the store alive.
#[derive(Clone)]
pub struct WeakAuthStore {
    inner: Weak<StoreInner>,
}

impl AuthStore {
    /// Build a store, subscribe it to the provider's events and run an
    /// initial sync.
    pub async fn create(provider: Arc<dyn AuthProvider>, config: StoreConfig) -> Self {
        let store = Self::new(Some(provider), config);
        store.wire_events();
        info!(debounce_ms = store.inner.config.debounce_ms, "Auth store created");
        store.sync_user("init").await;
        store
    }

    /// Build a store without touching the provider.
    ///
    /// With `provider == None` every sync resolves to
    /// [`AuthStatus::Anonymous`].
    pub fn new(provider: Option<Arc<dyn AuthProvider>>, config: StoreConfig) -> Self {
        Self::new_with_clock(provider, config, Arc::new(SystemClock))
    }

    pub fn new_with_clock(
        provider: Option<Arc<dyn AuthProvider>>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let debouncer = Debouncer::new(config.debounce());
        let (updates, _) = watch::channel(AuthSnapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                provider,
                config,
                clock,
                state: Mutex::new(StoreState::default()),
                updates,
                debouncer,
            }),
        }
    }

    /// Register the configured sync and reset handlers with the provider.
    ///
    /// Provider handlers cannot be removed, so this only registers once per
    /// store; later calls do nothing.
    pub fn wire_events(&self) {
        {
            let mut state = self.lock_state();
            if state.events_wired {
                return;
            }
            state.events_wired = true;
        }
        events::wire_events(self);
    }

    pub fn downgrade(&self) -> WeakAuthStore {
        WeakAuthStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.updates.subscribe()
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.updates.borrow().clone()
    }

    /// Number of queued edits, including those carried by in-flight flushes.
    pub fn pending_len(&self) -> usize {
        self.lock_state().pending.len()
    }

    pub fn debug_state(&self) -> DebugState {
        let state = self.lock_state();
        DebugState {
            status: state.status,
            has_server_user: state.server_user.is_some(),
            has_persist: state.persist.is_some(),
            pending: state.pending.len(),
            unclaimed: state.pending.has_unclaimed(),
            request_counter: state.request_counter,
            epoch: state.epoch,
            disposed: state.disposed,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.lock_state().disposed
    }

    /// Refresh status, payload and user from the provider.
    ///
    /// `reason` only shows up in logs. Safe to call repeatedly and
    /// concurrently; a fetch that no longer matches the session when it
    /// completes triggers a [`reset`](Self::reset) instead of being applied.
    pub async fn sync_user(&self, reason: &str) {
        if self.is_disposed() {
            debug!(reason, "Ignoring sync on disposed store");
            return;
        }
        if self.sync_once(reason).await == SyncOutcome::Mismatch {
            info!(reason, "Fetched user does not match the session; resetting");
            self.reset("payload/user mismatch").await;
        }
    }

    /// Drop all user data, return to [`AuthStatus::Pending`] and sync again.
    ///
    /// The follow-up sync does not reset a second time: if the user still
    /// does not match, the user data stays cleared.
    pub async fn reset(&self, reason: &str) {
        {
            let mut state = self.lock_state();
            if state.disposed {
                debug!(reason, "Ignoring reset on disposed store");
                return;
            }
            state.reset();
            self.publish(&mut state);
        }
        self.inner.debouncer.cancel_pending();
        info!(reason, "Auth store reset");

        if self.sync_once(reason).await == SyncOutcome::Mismatch {
            warn!(
                reason,
                "User still does not match the session after reset; clearing user data"
            );
            {
                let mut state = self.lock_state();
                state.clear_user_data();
                self.publish(&mut state);
            }
            self.inner.debouncer.cancel_pending();
        }
    }

    /// Queue an optimistic edit. Failures are logged, never returned.
    pub fn update_user(&self, patch: Patch) {
        if let Err(err) = self.try_update_user(patch) {
            warn!(error = %err, "User update rejected");
        }
    }

    /// Shorthand for [`update_user`](Self::update_user) with a single path.
    pub fn update_user_property(&self, path: &str, value: impl Into<Value>) {
        let mut patch = Patch::new();
        patch.insert(path.to_string(), value.into());
        self.update_user(patch);
    }

    /// Queue an optimistic edit and schedule a flush.
    ///
    /// The edit is visible in the published snapshot before this returns.
    /// All paths are validated first; one bad path rejects the whole patch.
    /// Returns the id of the queued [`PendingUpdate`].
    pub fn try_update_user(&self, patch: Patch) -> Result<Uuid> {
        if patch.is_empty() {
            return Err(StoreError::EmptyUpdate.into());
        }
        let updates = patch
            .into_iter()
            .map(|(path, value)| match PropertyPath::parse(&path) {
                Ok(parsed) => Ok((parsed, value)),
                Err(source) => Err(StoreError::InvalidPath { path, source }),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let id = {
            let mut state = self.lock_state();
            if state.disposed {
                return Err(StoreError::Disposed.into());
            }
            if state.server_user.is_none() {
                return Err(StoreError::AuthenticationRequired.into());
            }
            let update = PendingUpdate::new(updates, self.inner.clock.now());
            let id = update.id;
            debug!(%id, paths = update.updates.len(), "Queued optimistic update");
            state.pending.push(update);
            state.revision += 1;
            self.publish(&mut state);
            id
        };

        // Without a runtime the edit stays queued and goes out with the next
        // flush that does get scheduled.
        self.schedule_flush()?;
        Ok(id)
    }

    /// Add `item` to the list property at `path`, or remove it if present.
    ///
    /// The new value goes through [`update_user_property`](Self::update_user_property).
    pub fn toggle_user_list_item(&self, path: &str, item: &str, flags: CompareFlags) {
        let current = {
            let state = self.lock_state();
            PropertyPath::parse(path).ok().and_then(|parsed| {
                state
                    .effective_user
                    .as_ref()
                    .and_then(|user| get_path(user, &parsed))
                    .cloned()
            })
        };
        let toggled = toggle_in_list(current.as_ref(), item, flags);
        debug!(path, item, "Toggling list item");
        self.update_user_property(path, toggled);
    }

    /// Cancel the debounce timer and flush queued edits immediately.
    pub async fn flush_now(&self) {
        self.inner.debouncer.cancel_pending();
        self.flush_pending().await;
    }

    /// Stop reacting to provider events and drop any scheduled flush.
    ///
    /// A flush already in flight still completes. Call
    /// [`flush_now`](Self::flush_now) first to send queued edits.
    pub fn dispose(&self) {
        {
            let mut state = self.lock_state();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        let cancelled_flush = self.inner.debouncer.cancel_pending();
        info!(cancelled_flush, "Auth store disposed");
    }

    async fn sync_once(&self, reason: &str) -> SyncOutcome {
        let Some(provider) = self.inner.provider.clone() else {
            let mut state = self.lock_state();
            state.status = AuthStatus::Anonymous;
            self.publish(&mut state);
            debug!(reason, "No auth provider available; session is anonymous");
            return SyncOutcome::Unavailable;
        };

        let payload = provider.jwt_payload();
        let mut cleared = false;
        let epoch = {
            let mut state = self.lock_state();
            state.status = if payload.is_some() {
                AuthStatus::Authenticated
            } else {
                AuthStatus::Anonymous
            };
            if payload.is_none() && state.server_user.is_some() {
                debug!(reason, "Session payload is gone; clearing user data");
                state.clear_user_data();
                cleared = true;
            }
            state.payload = payload;
            self.publish(&mut state);
            state.payload.is_some().then_some(state.epoch)
        };
        if cleared {
            self.inner.debouncer.cancel_pending();
        }
        let Some(epoch) = epoch else {
            debug!(reason, "No session payload; session is anonymous");
            return SyncOutcome::Anonymous;
        };

        let fetched = match provider.get_user().await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(reason, error = %err, "Failed to fetch user; keeping current state");
                return SyncOutcome::Failed;
            }
        };

        let mut state = self.lock_state();
        if state.epoch != epoch {
            debug!(reason, "Store was reset during user fetch; discarding result");
            return SyncOutcome::Superseded;
        }
        let subject = state.payload.as_ref().and_then(JwtPayload::subject);
        let matches = fetched
            .as_ref()
            .and_then(FetchedUser::uid)
            .is_some_and(|uid| Some(uid) == subject);
        if !matches {
            if state.payload.is_none() && fetched.is_none() {
                return SyncOutcome::Anonymous;
            }
            debug!(
                reason,
                subject = ?subject,
                uid = ?fetched.as_ref().and_then(FetchedUser::uid),
                "Fetched user does not match payload subject"
            );
            return SyncOutcome::Mismatch;
        }

        if let Some(FetchedUser { record, persist }) = fetched {
            state.server_user = Some(record);
            state.persist = persist;
            state.status = AuthStatus::Authenticated;
            state.revision += 1;
            self.publish(&mut state);
            debug!(reason, "User synced");
        }
        SyncOutcome::Applied
    }

    fn schedule_flush(&self) -> std::result::Result<(), StoreError> {
        let weak = self.downgrade();
        self.inner.debouncer.schedule(move || {
            async move {
                if let Some(store) = weak.upgrade() {
                    store.flush_pending().await;
                }
            }
            .instrument(info_span!("auth_flush"))
        })
    }

    async fn flush_pending(&self) {
        let (persist, patch, request, epoch) = {
            let mut state = self.lock_state();
            let Some(persist) = state.persist.clone() else {
                debug!("No persistence binding; skipping flush");
                return;
            };
            if !state.pending.has_unclaimed() {
                debug!("Nothing to flush");
                return;
            }
            state.request_counter += 1;
            let request = state.request_counter;
            let (patch, claimed) = state.pending.claim(request);
            debug!(request, claimed, "Persisting pending updates");
            (persist, patch, request, state.epoch)
        };

        let result = persist.update(&patch).await;

        let mut state = self.lock_state();
        if state.epoch != epoch {
            debug!(request, "User data was cleared during flush; discarding result");
            return;
        }
        let settled = state.pending.settle(request);
        state.revision += 1;
        match result {
            Ok(Some(user)) if request == state.request_counter => {
                state.server_user = Some(user);
                debug!(request, settled, "Applied persisted user");
            }
            Ok(Some(_)) => {
                debug!(
                    request,
                    latest = state.request_counter,
                    "Discarding stale persistence response"
                );
            }
            Ok(None) => {
                warn!(request, settled, "Persistence returned no user; rolling back edits");
            }
            Err(err) => {
                warn!(request, settled, error = %err, "Failed to persist user edits; rolling back");
            }
        }
        if state.pending.is_empty() {
            state.request_counter = 0;
        }
        self.publish(&mut state);
    }

    /// Push the current state to observers if it changed.
    fn publish(&self, state: &mut StoreState) {
        state.refresh_effective_user();
        let snapshot = state.snapshot();
        self.inner.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl WeakAuthStore {
    /// Returns `None` once every strong handle is gone.
    pub fn upgrade(&self) -> Option<AuthStore> {
        self.inner.upgrade().map(|inner| AuthStore { inner })
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("has_provider", &self.inner.provider.is_some())
            .field("config", &self.inner.config)
            .field("state", &self.debug_state())
            .finish()
    }
}

impl fmt::Debug for WeakAuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakAuthStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
