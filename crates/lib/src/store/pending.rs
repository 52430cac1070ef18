//! Queue of optimistic edits awaiting persistence.
//!
//! Updates are kept in insertion order. A flush claims every unclaimed update
//! under one request number, and when that request settles all of its
//! updates leave the queue together, whether the write succeeded or not.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{path::PropertyPath, provider::Patch};

/// One queued edit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Parsed paths and their new values, in the order the caller gave them.
    pub updates: Vec<(PropertyPath, Value)>,
    /// Request number of the flush carrying this update, once claimed.
    pub request: Option<u64>,
}

impl PendingUpdate {
    pub fn new(updates: Vec<(PropertyPath, Value)>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            updates,
            request: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.request.is_some()
    }
}

/// Ordered queue of [`PendingUpdate`]s.
#[derive(Debug, Default, Clone)]
pub struct PendingQueue {
    updates: Vec<PendingUpdate>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: PendingUpdate) {
        self.updates.push(update);
    }

    /// Whether any update is still waiting for a flush.
    pub fn has_unclaimed(&self) -> bool {
        self.updates.iter().any(|u| !u.is_claimed())
    }

    /// Tags every unclaimed update with `request` and merges their edits in
    /// queue order into a single patch; later edits win on equal paths.
    ///
    /// Returns the patch and the number of updates claimed.
    pub fn claim(&mut self, request: u64) -> (Patch, usize) {
        let mut patch = Patch::new();
        let mut claimed = 0;
        for update in self.updates.iter_mut().filter(|u| !u.is_claimed()) {
            update.request = Some(request);
            claimed += 1;
            for (path, value) in &update.updates {
                patch.insert(path.as_str().to_string(), value.clone());
            }
        }
        (patch, claimed)
    }

    /// Drops every update carried by `request`. Returns how many were removed.
    pub fn settle(&mut self, request: u64) -> usize {
        let before = self.updates.len();
        self.updates.retain(|u| u.request != Some(request));
        before - self.updates.len()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingUpdate> {
        self.updates.iter()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}
