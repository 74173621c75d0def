//! Notification trigger. Assembles the webhook payload and hands it to the
//! companion link; when the link is down the event code is parked in the
//! deferred slot (overwriting any earlier one). Delivery is fire-and-forget:
//! the interval must never block on network conditions, so every transport
//! failure is logged and dropped.

use interval_core::NotifyKind;

use crate::message::{CompanionLink, Payload};
use crate::storage::{self, Store};

/// Expected size of the webhook bearer token; anything else is malformed
/// and the notification is skipped, not retried.
pub const TOKEN_LEN: usize = 22;

const MAX_EVENT_LEN: usize = 48;
const MAX_TITLE_LEN: usize = 32;
const DEFAULT_TITLE: &str = "task";

fn event_key(kind: NotifyKind) -> &'static str {
    match kind {
        NotifyKind::Started => storage::KEY_EVENT_STARTED,
        NotifyKind::Canceled => storage::KEY_EVENT_CANCELED,
        NotifyKind::Finished => storage::KEY_EVENT_FINISHED,
    }
}

/// Request delivery of `kind` to the webhook.
pub fn post_event<S: Store, C: CompanionLink>(store: &mut S, link: &mut C, kind: NotifyKind) {
    if !link.is_ready() {
        log::debug!("companion link not ready, deferring {:?}", kind);
        store.write_u32(storage::KEY_DEFERRED_EVENT, kind.to_persisted());
        return;
    }

    let Some(event) = store.read_string(event_key(kind), MAX_EVENT_LEN) else {
        return;
    };
    // Read one byte past the expected size so an oversized token is
    // distinguishable from an exact-size one.
    let Some(token) = store.read_string(storage::KEY_WEBHOOK_TOKEN, TOKEN_LEN + 1) else {
        return;
    };
    if token.len() != TOKEN_LEN {
        log::warn!(
            "webhook token has unexpected size {}, skipping {:?}",
            token.len(),
            kind
        );
        return;
    }
    let title = store
        .read_string(storage::KEY_TASK_TITLE, MAX_TITLE_LEN)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let payload = Payload {
        event,
        token,
        title,
    };
    if let Err(e) = link.send(&payload) {
        log::warn!("notification {:?} dropped: {}", kind, e);
    }
}
