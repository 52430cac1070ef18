//! Tests for optimistic updates and the debounced persistence flush.

use std::time::Duration;

use outseta_auth::{AuthStore, MemoryProvider, StoreConfig};
use serde_json::{Value, json};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_optimistic_update_then_confirm() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    assert_eq!(full_name(&store), Some(json!("Jane")));
    assert_eq!(store.pending_len(), 1);
    assert!(provider.received_patches().is_empty());

    past_debounce().await;

    assert_eq!(store.pending_len(), 0);
    assert_eq!(full_name(&store), Some(json!("Jane")));
    assert_eq!(
        provider.user(),
        Some(json!({"Uid": "u1", "Account": {"FullName": "Jane"}}))
    );
    assert_eq!(store.debug_state().request_counter, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_persistence_rolls_back() {
    let (provider, store) = session_store().await;
    provider.set_fail_updates(true);

    store.update_user_property("Account.FullName", "Jane");
    assert_eq!(full_name(&store), Some(json!("Jane")));

    past_debounce().await;

    assert_eq!(store.pending_len(), 0);
    assert_eq!(full_name(&store), Some(json!("John")));
    assert_eq!(provider.received_patches().len(), 1);
    assert_eq!(store.debug_state().request_counter, 0);
}

#[tokio::test(start_paused = true)]
async fn test_last_write_wins_within_a_batch() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    store.update_user_property("Account.FullName", "Janet");
    assert_eq!(full_name(&store), Some(json!("Janet")));
    assert_eq!(store.pending_len(), 2);

    past_debounce().await;

    let patches = provider.received_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0], patch(&[("Account.FullName", json!("Janet"))]));
    assert_eq!(full_name(&store), Some(json!("Janet")));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_updates_coalesce_into_one_flush() {
    let (provider, store) = session_store().await;

    for i in 0..5 {
        store.update_user_property(&format!("Field{i}"), i);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(provider.received_patches().is_empty());

    past_debounce().await;

    let patches = provider.received_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        Value::Object(patches[0].clone()),
        json!({"Field0": 0, "Field1": 1, "Field2": 2, "Field3": 3, "Field4": 4})
    );
    assert_eq!(store.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_multi_path_update_is_one_pending_entry() {
    let (provider, store) = session_store().await;

    store.update_user(patch(&[
        ("Account.FullName", json!("Jane")),
        ("Tags[0]", json!("vip")),
    ]));
    assert_eq!(store.pending_len(), 1);
    let user = store.snapshot().user.unwrap();
    assert_eq!(user["Tags"], json!(["vip"]));

    past_debounce().await;
    assert_eq!(provider.user().unwrap()["Tags"], json!(["vip"]));
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_does_not_overwrite_newer_one() {
    let (provider, store) = session_store().await;

    // Flush A starts at 500ms and resolves at 1500ms.
    provider.push_update_delay(Duration::from_millis(1_000));
    store.update_user_property("Title", "A");
    past_debounce().await;
    assert_eq!(store.debug_state().request_counter, 1);

    // Flush B starts at 1100ms and resolves immediately.
    store.update_user_property("Title", "B");
    assert_eq!(store.snapshot().user_property("Title"), Some(&json!("B")));
    past_debounce().await;
    assert_eq!(store.debug_state().request_counter, 2);

    // A resolves last, with a record that has Title "A".
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(provider.user().unwrap()["Title"], json!("A"));

    assert_eq!(store.pending_len(), 0);
    assert_eq!(store.snapshot().user_property("Title"), Some(&json!("B")));
    assert_eq!(store.debug_state().request_counter, 0);
}

#[tokio::test(start_paused = true)]
async fn test_lone_flush_result_is_applied() {
    let (provider, store) = session_store().await;
    store.update_user_property("Account.FullName", "Jane");

    // Another client changes the record between our edit and its flush.
    let mut remote = provider.user().unwrap();
    remote["Title"] = json!("CEO");
    provider.set_user(Some(remote));

    past_debounce().await;

    // The returned record replaced the server user, remote change included.
    assert_eq!(store.snapshot().user_property("Title"), Some(&json!("CEO")));
    assert_eq!(full_name(&store), Some(json!("Jane")));
}

#[tokio::test(start_paused = true)]
async fn test_update_without_session_is_rejected() {
    let provider = MemoryProvider::new();
    let store = AuthStore::create(
        std::sync::Arc::new(provider.clone()),
        StoreConfig::default(),
    )
    .await;

    store.update_user_property("Account.FullName", "Jane");
    assert_eq!(store.pending_len(), 0);
    assert!(store.snapshot().user.is_none());

    let err = store
        .try_update_user(patch(&[("Account.FullName", json!("Jane"))]))
        .unwrap_err();
    assert!(err.is_authentication_error());

    past_debounce().await;
    assert!(provider.received_patches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_path_is_rejected_without_side_effects() {
    let (provider, store) = session_store().await;

    let err = store
        .try_update_user(patch(&[("Account..FullName", json!("Jane"))]))
        .unwrap_err();
    assert!(err.is_invalid_update());
    assert!(err.is_path_error());

    store.update_user_property("Tags[999999]", "vip");
    assert_eq!(store.pending_len(), 0);

    past_debounce().await;
    assert!(provider.received_patches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_flush_during_reset_is_discarded() {
    let (provider, store) = session_store().await;

    provider.push_update_delay(Duration::from_millis(500));
    store.update_user_property("Account.FullName", "Jane");
    past_debounce().await;

    // The reset re-fetches before the write lands.
    store.reset("manual").await;
    assert_eq!(full_name(&store), Some(json!("John")));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(provider.user().unwrap()["Account"]["FullName"], json!("Jane"));
    assert_eq!(full_name(&store), Some(json!("John")));
    assert_eq!(store.pending_len(), 0);

    store.sync_user("refresh").await;
    assert_eq!(full_name(&store), Some(json!("Jane")));
}

#[tokio::test(start_paused = true)]
async fn test_flush_from_previous_session_does_not_stomp_newer_edit() {
    let (provider, store) = session_store().await;

    // Flush A starts at 500ms and resolves at 2500ms.
    provider.push_update_delay(Duration::from_millis(2_000));
    store.update_user_property("Title", "A");
    past_debounce().await;
    assert_eq!(store.debug_state().request_counter, 1);

    // The session drops and comes back while A is in flight.
    provider.set_payload(None);
    store.sync_user("session gone").await;
    assert!(store.snapshot().user.is_none());
    assert_eq!(store.debug_state().epoch, 1);

    provider.set_payload(Some(payload("u1")));
    store.sync_user("session back").await;
    assert!(store.snapshot().user.is_some());

    // Flush B is issued as request 1 again and resolves right away.
    store.update_user_property("Title", "B");
    past_debounce().await;
    assert_eq!(store.snapshot().user_property("Title"), Some(&json!("B")));

    // A lands last and must not touch the new session's state.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.snapshot().user_property("Title"), Some(&json!("B")));
    assert_eq!(store.pending_len(), 0);
    assert_eq!(store.debug_state().request_counter, 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_loss_cancels_scheduled_flush() {
    let (provider, store) = session_store().await;

    store.update_user_property("Account.FullName", "Jane");
    provider.set_payload(None);
    store.sync_user("session gone").await;
    assert_eq!(store.pending_len(), 0);

    past_debounce().await;
    assert!(provider.received_patches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_custom_debounce_window() {
    let provider = session_provider("u1");
    let config = StoreConfig::default().with_debounce(Duration::from_millis(50));
    let store = AuthStore::create(std::sync::Arc::new(provider.clone()), config).await;

    store.update_user_property("Account.FullName", "Jane");
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(provider.received_patches().len(), 1);
    assert_eq!(store.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_update_returns_queued_id() {
    let (_provider, store) = session_store().await;

    let first = store
        .try_update_user(patch(&[("Title", json!("A"))]))
        .unwrap();
    let second = store
        .try_update_user(patch(&[("Title", json!("B"))]))
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(store.pending_len(), 2);
}
