//! Provider event wiring.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{Instrument, debug, info_span, trace, warn};

use super::{AuthStore, WeakAuthStore};
use crate::provider::EventHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventAction {
    Sync,
    Reset,
}

/// Subscribe `store` to every configured sync and reset event.
pub(super) fn wire_events(store: &AuthStore) {
    let Some(provider) = store.inner.provider.as_ref() else {
        debug!("No auth provider; skipping event wiring");
        return;
    };
    let config = &store.inner.config;

    for event in &config.sync_events {
        provider.on(event, handler(store.downgrade(), event, EventAction::Sync));
    }
    for event in &config.reset_events {
        provider.on(event, handler(store.downgrade(), event, EventAction::Reset));
    }
    debug!(
        sync_events = config.sync_events.len(),
        reset_events = config.reset_events.len(),
        "Wired provider events"
    );
}

fn handler(store: WeakAuthStore, event: &str, action: EventAction) -> EventHandler {
    let event = event.to_string();
    Arc::new(move || {
        let Some(store) = store.upgrade() else {
            trace!(event = %event, "Auth store dropped; ignoring provider event");
            return;
        };
        if store.is_disposed() {
            trace!(event = %event, "Auth store disposed; ignoring provider event");
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(event = %event, "No tokio runtime to handle provider event");
            return;
        };

        let span = info_span!("auth_event", event = %event, ?action);
        let event = event.clone();
        runtime.spawn(
            async move {
                match action {
                    EventAction::Sync => store.sync_user(&event).await,
                    EventAction::Reset => store.reset(&event).await,
                }
            }
            .instrument(span),
        );
    })
}
