//!
//! Outseta auth: a session and user-profile store for UI layers built on the
//! Outseta auth SDK.
//!
//! ## Core Concepts
//!
//! * **Provider (`provider::AuthProvider`)**: The external source of session state. It hands out the JWT payload, fetches the user record and emits lifecycle events. `provider::MemoryProvider` implements it in process.
//! * **Store (`store::AuthStore`)**: Mirrors the provider's session. Holds the last server-confirmed user, a queue of optimistic edits and the derived effective user, and publishes `store::AuthSnapshot` values to subscribers.
//! * **Pending updates (`store::PendingUpdate`)**: Edits shown immediately and persisted by a debounced flush that merges them into one patch. Out-of-order responses are detected by request number and discarded.
//! * **Property paths (`path::PropertyPath`)**: Dot and index paths such as `Account.FullName` or `Tags[0]` used to read and write nested user properties.
//! * **Access checks (`access`)**: Plan, add-on and property comparisons UI layers use to decide what to show.

pub mod access;
pub mod clock;
pub mod config;
pub mod constants;
pub mod path;
pub mod provider;
pub mod store;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use config::StoreConfig;
pub use provider::{AuthProvider, JwtPayload, MemoryProvider, Patch};
pub use store::{AuthSnapshot, AuthStatus, AuthStore, WeakAuthStore};

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured path errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured provider errors from the provider module
    #[error(transparent)]
    Provider(provider::ProviderError),

    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Path(_) => "path",
            Error::Provider(_) => "provider",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error was raised by the auth provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Error::Provider(_))
    }

    /// Check if this error was raised by the store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Check if this error is about a malformed property path.
    pub fn is_path_error(&self) -> bool {
        match self {
            Error::Path(_) => true,
            Error::Store(store_err) => store_err.path().is_some(),
            _ => false,
        }
    }

    /// Check if this error means a logged-in user was required.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::Store(store::StoreError::AuthenticationRequired))
    }

    /// Check if the store refused the call in its current state.
    pub fn is_precondition_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_precondition_error(),
            _ => false,
        }
    }

    /// Check if this error is a failed write to the provider.
    pub fn is_persist_error(&self) -> bool {
        match self {
            Error::Provider(provider_err) => provider_err.is_persist_error(),
            _ => false,
        }
    }

    /// Check if this error is a failed user fetch.
    pub fn is_fetch_error(&self) -> bool {
        match self {
            Error::Provider(provider_err) => provider_err.is_fetch_error(),
            _ => false,
        }
    }

    /// Check if the caller passed an unusable update.
    pub fn is_invalid_update(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_invalid_update(),
            Error::Path(_) => true,
            _ => false,
        }
    }
}
