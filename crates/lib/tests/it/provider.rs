//! The in-memory provider behind a store.

use std::{sync::Arc, time::Duration};

use outseta_auth::{
    AuthProvider, AuthStore, MemoryProvider, StoreConfig,
    provider::{FetchedUser, Patch, PersistUser},
};
use serde_json::json;

use crate::helpers::*;

/// A provider whose records have no persistence binding.
struct ReadOnlyProvider {
    inner: MemoryProvider,
}

#[async_trait::async_trait]
impl AuthProvider for ReadOnlyProvider {
    fn jwt_payload(&self) -> Option<outseta_auth::JwtPayload> {
        self.inner.jwt_payload()
    }

    async fn get_user(&self) -> outseta_auth::Result<Option<FetchedUser>> {
        let user = self.inner.get_user().await?;
        Ok(user.map(|user| FetchedUser::new(user.record, None)))
    }

    fn on(&self, event: &str, handler: outseta_auth::provider::EventHandler) {
        self.inner.on(event, handler);
    }
}

/// Persistence that accepts the call but returns nothing.
struct EmptyPersist;

#[async_trait::async_trait]
impl PersistUser for EmptyPersist {
    async fn update(&self, _patch: &Patch) -> outseta_auth::Result<Option<serde_json::Value>> {
        Ok(None)
    }
}

struct EmptyPersistProvider {
    inner: MemoryProvider,
}

#[async_trait::async_trait]
impl AuthProvider for EmptyPersistProvider {
    fn jwt_payload(&self) -> Option<outseta_auth::JwtPayload> {
        self.inner.jwt_payload()
    }

    async fn get_user(&self) -> outseta_auth::Result<Option<FetchedUser>> {
        let user = self.inner.get_user().await?;
        Ok(user.map(|user| FetchedUser::new(user.record, Some(Arc::new(EmptyPersist)))))
    }

    fn on(&self, event: &str, handler: outseta_auth::provider::EventHandler) {
        self.inner.on(event, handler);
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_persistence_binding_keeps_edits_queued() {
    let provider = ReadOnlyProvider {
        inner: session_provider("u1"),
    };
    let store = AuthStore::create(Arc::new(provider), StoreConfig::default()).await;
    assert!(!store.debug_state().has_persist);

    store.update_user_property("Account.FullName", "Jane");
    past_debounce().await;

    assert_eq!(store.pending_len(), 1);
    assert_eq!(full_name(&store), Some(json!("Jane")));
}

#[tokio::test(start_paused = true)]
async fn test_empty_persist_result_rolls_back() {
    let provider = EmptyPersistProvider {
        inner: session_provider("u1"),
    };
    let store = AuthStore::create(Arc::new(provider), StoreConfig::default()).await;

    store.update_user_property("Account.FullName", "Jane");
    past_debounce().await;

    assert_eq!(store.pending_len(), 0);
    assert_eq!(full_name(&store), Some(json!("John")));
}

#[tokio::test(start_paused = true)]
async fn test_slow_initial_fetch_does_not_block_other_operations() {
    let provider = session_provider("u1");
    provider.push_fetch_delay(Duration::from_secs(5));
    let store = AuthStore::new(Some(Arc::new(provider.clone())), StoreConfig::default());

    let init = tokio::spawn({
        let store = store.clone();
        async move { store.sync_user("init").await }
    });
    settle().await;

    // Status is known from the payload before the user arrives.
    let snapshot = store.snapshot();
    assert!(snapshot.is_authenticated());
    assert!(snapshot.user.is_none());
    assert_eq!(store.pending_len(), 0);

    init.await.unwrap();
    assert_eq!(store.snapshot().user, Some(john("u1")));
}

#[tokio::test]
async fn test_store_works_through_trait_object() {
    let provider: Arc<dyn AuthProvider> = Arc::new(session_provider("u1"));
    let store = AuthStore::create(Arc::clone(&provider), StoreConfig::default()).await;
    assert_eq!(store.snapshot().payload, provider.jwt_payload());
}
