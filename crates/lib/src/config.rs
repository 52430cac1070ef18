//! Store configuration.
//!
//! Hosts usually take the defaults. The configuration can also be embedded as
//! JSON (e.g. in a page's inline settings) and loaded with
//! [`StoreConfig::from_json`]; missing fields fall back to their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_RESET_EVENTS, DEFAULT_SYNC_EVENTS};

/// Tunables for an [`AuthStore`](crate::store::AuthStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Quiet period in milliseconds before pending edits are persisted.
    pub debounce_ms: u64,
    /// Provider events that trigger `sync_user`.
    pub sync_events: Vec<String>,
    /// Provider events that trigger `reset`.
    pub reset_events: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            sync_events: DEFAULT_SYNC_EVENTS.iter().map(|e| e.to_string()).collect(),
            reset_events: DEFAULT_RESET_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_sync_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sync_events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reset_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reset_events = events.into_iter().map(Into::into).collect();
        self
    }

    /// The debounce quiet period.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
