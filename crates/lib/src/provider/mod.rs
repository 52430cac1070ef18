//! Auth provider abstractions.
//!
//! The store never talks to the network itself. Everything it knows about the
//! session comes from an [`AuthProvider`]: a synchronous JWT payload read, an
//! asynchronous user fetch, and lifecycle event subscriptions. Each fetched
//! user carries its own [`PersistUser`] binding used to write edits back.
//!
//! [`MemoryProvider`] is an in-process implementation for hosts without a
//! remote SDK and for tests.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Result, constants::USER_ID_FIELD};

mod errors;
mod memory;
mod payload;

pub use errors::ProviderError;
pub use memory::MemoryProvider;
pub use payload::JwtPayload;

/// A partial user update keyed by property path (`"Account.FullName"`).
pub type Patch = Map<String, Value>;

/// Callback invoked when the provider emits an event.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Source of session state for an [`AuthStore`](crate::store::AuthStore).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session claims, or `None` when nobody is logged in.
    ///
    /// Must not block.
    fn jwt_payload(&self) -> Option<JwtPayload>;

    /// Fetch the full user record for the current session.
    ///
    /// May wait for the provider to finish its own initialization; the store
    /// imposes no timeout.
    async fn get_user(&self) -> Result<Option<FetchedUser>>;

    /// Register `handler` for `event`. Handlers are never unregistered.
    fn on(&self, event: &str, handler: EventHandler);
}

/// Write path for a fetched user record.
#[async_trait]
pub trait PersistUser: Send + Sync {
    /// Persist `patch` and return the updated record.
    ///
    /// `Ok(None)` means the provider accepted the call but returned no
    /// record; the store treats it like a failure.
    async fn update(&self, patch: &Patch) -> Result<Option<Value>>;
}

/// A user record returned by [`AuthProvider::get_user`], together with the
/// persistence binding for that record.
#[derive(Clone)]
pub struct FetchedUser {
    pub record: Value,
    pub persist: Option<Arc<dyn PersistUser>>,
}

impl FetchedUser {
    pub fn new(record: Value, persist: Option<Arc<dyn PersistUser>>) -> Self {
        Self { record, persist }
    }

    /// The record's unique id (`Uid`).
    pub fn uid(&self) -> Option<&str> {
        self.record.get(USER_ID_FIELD).and_then(Value::as_str)
    }
}

// `dyn PersistUser` has no Debug; show whether a binding exists instead.
impl fmt::Debug for FetchedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedUser")
            .field("record", &self.record)
            .field("persist", &self.persist.is_some())
            .finish()
    }
}
