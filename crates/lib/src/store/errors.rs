//! Error types for store operations.
//!
//! The public store operations never return these; they log them and keep the
//! last known good state. They surface through the `try_*` variants.

use thiserror::Error;

use crate::path::PathError;

/// Reasons a store operation was rejected.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No user record is loaded, so there is nothing to edit.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The store was disposed and no longer accepts operations.
    #[error("Store has been disposed")]
    Disposed,

    /// An update carried no properties.
    #[error("Update contains no properties")]
    EmptyUpdate,

    /// A property path in an update could not be parsed.
    #[error("Invalid property path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    /// Background work needs a tokio runtime and none was running.
    #[error("No tokio runtime available to schedule {task}")]
    NoRuntime { task: &'static str },
}

impl StoreError {
    /// Check if this error is a rejected precondition rather than bad input.
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            StoreError::AuthenticationRequired | StoreError::Disposed
        )
    }

    /// Check if the caller passed an unusable update.
    pub fn is_invalid_update(&self) -> bool {
        matches!(
            self,
            StoreError::EmptyUpdate | StoreError::InvalidPath { .. }
        )
    }

    /// The offending path, if this is a path error.
    pub fn path(&self) -> Option<&str> {
        match self {
            StoreError::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
