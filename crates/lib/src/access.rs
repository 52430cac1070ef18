//! Checks UI layers run against a published [`AuthSnapshot`].
//!
//! Conditional rendering boils down to reading a claim or a user property and
//! comparing it with an expected value. Every check here answers `false` when
//! the data it needs is missing, so a caller hiding content on `false` hides it
//! until the session is loaded.
//!
//! List-valued user properties (bookmarks, completed lessons) are stored either
//! as JSON arrays or as comma-separated strings; [`toggle_in_list`] and
//! [`list_contains`] accept both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{path::lookup, store::AuthSnapshot};

/// How a property is compared with the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// The property equals the expected value.
    #[default]
    Equal,
    /// The property is a list containing the expected value.
    #[serde(alias = "includes")]
    ArrayIncludes,
}

/// Modifiers for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareFlags {
    /// Compare strings without regard to case.
    pub ignore_case: bool,
}

impl CompareFlags {
    pub const NONE: CompareFlags = CompareFlags { ignore_case: false };
    pub const IGNORE_CASE: CompareFlags = CompareFlags { ignore_case: true };
}

fn str_eq(a: &str, b: &str, flags: CompareFlags) -> bool {
    if flags.ignore_case {
        a.to_uppercase() == b.to_uppercase()
    } else {
        a == b
    }
}

fn value_eq(actual: &Value, expected: &Value, flags: CompareFlags) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => str_eq(a, b, flags),
        _ => actual == expected,
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Compare `property` with `expected`. A missing property never matches.
pub fn compare(
    property: Option<&Value>,
    expected: &Value,
    mode: CompareMode,
    flags: CompareFlags,
) -> bool {
    let Some(property) = property else {
        return false;
    };
    match mode {
        CompareMode::Equal => value_eq(property, expected, flags),
        CompareMode::ArrayIncludes => match property {
            Value::Array(items) => items.iter().any(|item| value_eq(item, expected, flags)),
            Value::String(list) => match expected {
                Value::String(expected) => {
                    split_list(list).any(|part| str_eq(part, expected, flags))
                }
                _ => false,
            },
            _ => false,
        },
    }
}

/// Whether the list property `current` contains `item`.
pub fn list_contains(current: Option<&Value>, item: &str, flags: CompareFlags) -> bool {
    compare(
        current,
        &Value::String(item.to_string()),
        CompareMode::ArrayIncludes,
        flags,
    )
}

/// Add `item` to the list, or remove every occurrence of it if present.
///
/// An array stays an array. A string is treated as a comma-separated list and
/// rejoined with `,`. Anything else counts as an empty list and yields a
/// string.
pub fn toggle_in_list(current: Option<&Value>, item: &str, flags: CompareFlags) -> Value {
    match current {
        Some(Value::Array(items)) => {
            let present = items
                .iter()
                .any(|v| v.as_str().is_some_and(|s| str_eq(s, item, flags)));
            let mut items = items.clone();
            if present {
                items.retain(|v| !v.as_str().is_some_and(|s| str_eq(s, item, flags)));
            } else {
                items.push(Value::String(item.to_string()));
            }
            Value::Array(items)
        }
        other => {
            let list = other.and_then(Value::as_str).unwrap_or_default();
            let mut parts: Vec<&str> = split_list(list).collect();
            if parts.iter().any(|part| str_eq(part, item, flags)) {
                parts.retain(|part| !str_eq(part, item, flags));
            } else {
                parts.push(item);
            }
            Value::String(parts.join(","))
        }
    }
}

impl AuthSnapshot {
    /// Whether the session's plan is `plan_uid`.
    pub fn has_plan(&self, plan_uid: &str) -> bool {
        self.payload
            .as_ref()
            .and_then(|payload| payload.plan_uid())
            .is_some_and(|uid| uid == plan_uid)
    }

    /// Whether the session includes the add-on `add_on_uid`.
    pub fn has_add_on(&self, add_on_uid: &str) -> bool {
        self.payload
            .as_ref()
            .is_some_and(|payload| payload.add_on_uids().contains(&add_on_uid))
    }

    /// Value at `path` in the effective user.
    pub fn user_property(&self, path: &str) -> Option<&Value> {
        self.user.as_ref().and_then(|user| lookup(user, path))
    }

    /// Value at `path` in the JWT claims.
    pub fn payload_claim(&self, path: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|payload| payload.claim(path))
    }

    pub fn user_property_matches(
        &self,
        path: &str,
        expected: &Value,
        mode: CompareMode,
        flags: CompareFlags,
    ) -> bool {
        compare(self.user_property(path), expected, mode, flags)
    }

    pub fn payload_claim_matches(
        &self,
        path: &str,
        expected: &Value,
        mode: CompareMode,
        flags: CompareFlags,
    ) -> bool {
        compare(self.payload_claim(path), expected, mode, flags)
    }

    /// Whether the user's list property at `path` contains `item`.
    pub fn list_contains(&self, path: &str, item: &str, flags: CompareFlags) -> bool {
        list_contains(self.user_property(path), item, flags)
    }
}
