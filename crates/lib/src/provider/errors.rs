//! Error types for auth provider calls.

use thiserror::Error;

/// Failures reported by an [`AuthProvider`](super::AuthProvider) or a
/// [`PersistUser`](super::PersistUser) binding.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has not finished initializing.
    #[error("Auth provider is not ready")]
    NotReady,

    /// Fetching the user record failed.
    #[error("Failed to fetch user: {reason}")]
    FetchFailed { reason: String },

    /// Persisting a patch failed.
    #[error("Failed to persist user update: {reason}")]
    PersistFailed { reason: String },

    /// The provider returned data the store cannot use.
    #[error("Invalid provider response: {reason}")]
    InvalidResponse { reason: String },
}

impl ProviderError {
    /// Check if this error happened on the write path.
    pub fn is_persist_error(&self) -> bool {
        matches!(self, ProviderError::PersistFailed { .. })
    }

    /// Check if this error happened while reading session state.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            ProviderError::NotReady | ProviderError::FetchFailed { .. }
        )
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}
