//! Decoded session claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{constants::*, path::lookup};

/// Claims of the current session's JWT.
///
/// Treated as an opaque value and replaced wholesale on every sync. The
/// accessors cover the claims the toolkit reads; anything else is available
/// through [`JwtPayload::claim`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwtPayload {
    claims: Value,
}

impl JwtPayload {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self {
            claims: Value::Object(claims),
        }
    }

    /// Wraps a JSON value; only objects are valid claim sets.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(claims) => Some(Self::new(claims)),
            _ => None,
        }
    }

    /// Subject claim; must equal the fetched user's `Uid`.
    pub fn subject(&self) -> Option<&str> {
        self.str_claim(CLAIM_SUBJECT)
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim(CLAIM_EMAIL)
    }

    pub fn plan_uid(&self) -> Option<&str> {
        self.str_claim(CLAIM_PLAN_UID)
    }

    pub fn account_uid(&self) -> Option<&str> {
        self.str_claim(CLAIM_ACCOUNT_UID)
    }

    pub fn subscription_uid(&self) -> Option<&str> {
        self.str_claim(CLAIM_SUBSCRIPTION_UID)
    }

    /// Add-on uids. A lone string claim is treated as a one-element list.
    pub fn add_on_uids(&self) -> Vec<&str> {
        match self.claims.get(CLAIM_ADD_ON_UIDS) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(uid)) if !uid.is_empty() => vec![uid.as_str()],
            _ => Vec::new(),
        }
    }

    /// Whether the person is the account's primary contact.
    pub fn is_primary(&self) -> bool {
        match self.claims.get(CLAIM_IS_PRIMARY) {
            Some(Value::Bool(primary)) => *primary,
            Some(Value::String(flag)) => flag == "1" || flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Reads an arbitrary claim by property path.
    pub fn claim(&self, path: &str) -> Option<&Value> {
        lookup(&self.claims, path)
    }

    fn str_claim(&self, key: &str) -> Option<&str> {
        self.claims.get(key).and_then(Value::as_str)
    }
}
