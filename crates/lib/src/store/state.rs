//! Published store state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::JwtPayload;

/// Authentication status of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Not yet determined.
    #[default]
    Pending,
    /// No session.
    Anonymous,
    /// Valid session.
    Authenticated,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Pending => "pending",
            AuthStatus::Anonymous => "anonymous",
            AuthStatus::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What observers see: status, session claims and the effective user.
///
/// `user` is the server record with all pending edits overlaid. It is `None`
/// exactly when no server record is loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub payload: Option<JwtPayload>,
    pub user: Option<Value>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}
