use std::{sync::Arc, time::Duration};

use outseta_auth::{AuthStore, JwtPayload, MemoryProvider, Patch, StoreConfig};
use serde_json::{Value, json};

/// Debounce window used by every store built here.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Payload whose subject is `sub`.
pub fn payload(sub: &str) -> JwtPayload {
    JwtPayload::from_value(json!({
        "sub": sub,
        "email": format!("{sub}@example.com"),
        "outseta:planUid": "gold",
    }))
    .expect("payload is an object")
}

/// The server record the example scenarios start from.
pub fn john(uid: &str) -> Value {
    json!({"Uid": uid, "Account": {"FullName": "John"}})
}

pub fn session_provider(uid: &str) -> MemoryProvider {
    MemoryProvider::with_session(payload(uid), john(uid))
}

/// Provider with a logged-in `u1` session and a store created on top of it.
pub async fn session_store() -> (MemoryProvider, AuthStore) {
    let provider = session_provider("u1");
    let store = AuthStore::create(Arc::new(provider.clone()), StoreConfig::default()).await;
    (provider, store)
}

pub fn patch(pairs: &[(&str, Value)]) -> Patch {
    pairs
        .iter()
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect()
}

/// Effective `Account.FullName`, if a user is loaded.
pub fn full_name(store: &AuthStore) -> Option<Value> {
    store
        .snapshot()
        .user_property("Account.FullName")
        .cloned()
}

/// Sleep past the debounce window so a scheduled flush runs.
pub async fn past_debounce() {
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
}

/// Let spawned event handlers run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
