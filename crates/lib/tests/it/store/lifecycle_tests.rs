//! Tests for event wiring, disposal and store lifetime.

use std::{sync::Arc, time::Duration};

use outseta_auth::{
    AuthStatus, AuthStore, StoreConfig,
    constants::{DEFAULT_RESET_EVENTS, DEFAULT_SYNC_EVENTS, EVENT_PROFILE_UPDATE},
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_create_wires_default_events_once() {
    let (provider, store) = session_store().await;

    for event in DEFAULT_SYNC_EVENTS.iter().chain(DEFAULT_RESET_EVENTS.iter()) {
        assert_eq!(provider.handler_count(event), 1, "event {event}");
    }

    store.wire_events();
    assert_eq!(provider.handler_count(EVENT_PROFILE_UPDATE), 1);
}

#[tokio::test]
async fn test_sync_event_refreshes_user() {
    let (provider, store) = session_store().await;

    provider.set_user(Some(json!({"Uid": "u1", "Account": {"FullName": "Johnny"}})));
    provider.emit(EVENT_PROFILE_UPDATE);
    settle().await;

    assert_eq!(full_name(&store), Some(json!("Johnny")));
    assert_eq!(provider.fetch_count(), 2);
}

#[tokio::test]
async fn test_logout_event_resets_to_anonymous() {
    let (provider, store) = session_store().await;

    provider.logout();
    settle().await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Anonymous);
    assert!(snapshot.payload.is_none());
    assert!(snapshot.user.is_none());
    assert_eq!(store.debug_state().epoch, 1);
}

#[tokio::test]
async fn test_custom_events() {
    let provider = session_provider("u1");
    let config = StoreConfig::default()
        .with_sync_events(["refresh"])
        .with_reset_events(["signout"]);
    let store = AuthStore::create(Arc::new(provider.clone()), config).await;

    assert_eq!(provider.handler_count(EVENT_PROFILE_UPDATE), 0);
    assert_eq!(provider.handler_count("refresh"), 1);

    provider.set_payload(None);
    provider.emit("signout");
    settle().await;
    assert_eq!(store.snapshot().status, AuthStatus::Anonymous);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_ignores_events_and_drops_scheduled_flush() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    store.dispose();
    assert!(store.is_disposed());

    provider.emit(EVENT_PROFILE_UPDATE);
    past_debounce().await;

    assert_eq!(provider.fetch_count(), 1);
    assert!(provider.received_patches().is_empty());
    assert_eq!(store.pending_len(), 1);

    store.update_user_property("Account.FullName", "Janet");
    assert_eq!(store.pending_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flush_now_sends_queued_edits_immediately() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    store.flush_now().await;

    assert_eq!(provider.received_patches().len(), 1);
    assert_eq!(store.pending_len(), 0);

    // The cancelled timer does not fire a second flush.
    past_debounce().await;
    assert_eq!(provider.received_patches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flush_now_before_dispose_keeps_edits() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    store.flush_now().await;
    store.dispose();

    assert_eq!(provider.user().unwrap()["Account"]["FullName"], json!("Jane"));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_store_ignores_events_and_timers() {
    let (provider, store) = session_store().await;
    let weak = store.downgrade();

    store.update_user_property("Account.FullName", "Jane");
    drop(store);
    assert!(weak.upgrade().is_none());

    provider.emit(EVENT_PROFILE_UPDATE);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(provider.fetch_count(), 1);
    assert!(provider.received_patches().is_empty());
}

#[tokio::test]
async fn test_debug_output_mentions_state() {
    let (_provider, store) = session_store().await;
    let output = format!("{store:?}");
    assert!(output.contains("AuthStore"));
    assert!(output.contains("Authenticated"));
}
