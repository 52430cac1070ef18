//! Effective user derivation.

use serde_json::Value;

use super::pending::PendingQueue;
use crate::path::set_path;

/// Overlays every pending edit, in queue order, on a copy of the server user.
///
/// Pure: the same inputs always produce the same output and nothing else is
/// touched. Returns `None` exactly when `server_user` is `None`.
pub fn compute_effective_user(
    server_user: Option<&Value>,
    pending: &PendingQueue,
) -> Option<Value> {
    let mut user = server_user?.clone();
    for update in pending.iter() {
        for (path, value) in &update.updates {
            set_path(&mut user, path, value.clone());
        }
    }
    Some(user)
}
