//! Companion-link boundary: inbound key/value configuration updates from
//! the paired device, the link-readiness gate, and the deferred-notification
//! flush that runs when the link comes up. The outbound webhook transport
//! itself lives on the companion side.

use interval_core::NotifyKind;

use crate::notify;
use crate::storage::{self, Store};

/// Keys the companion is allowed to write. Anything else is dropped.
const INBOUND_KEYS: &[&str] = &[
    storage::KEY_WEBHOOK_TOKEN,
    storage::KEY_EVENT_STARTED,
    storage::KEY_EVENT_CANCELED,
    storage::KEY_EVENT_FINISHED,
    storage::KEY_TASK_TITLE,
    storage::KEY_TASKLIST_TOKEN,
];

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("companion transport failure: {0}")]
    Transport(String),
}

/// Outbound webhook payload: three strings, nothing else.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Payload {
    pub event: String,
    pub token: String,
    pub title: String,
}

pub trait CompanionLink {
    fn is_ready(&self) -> bool;
    fn send(&mut self, payload: &Payload) -> Result<(), SendError>;
}

/// Host stand-in for an unpaired device: never ready, so notifications land
/// in the deferred slot.
pub struct NullLink;

impl CompanionLink for NullLink {
    fn is_ready(&self) -> bool {
        false
    }

    fn send(&mut self, _payload: &Payload) -> Result<(), SendError> {
        Ok(())
    }
}

/// Apply one inbound key/value update. Returns whether the key was accepted.
pub fn apply_update<S: Store>(store: &mut S, key: &str, value: &str) -> bool {
    if !INBOUND_KEYS.contains(&key) {
        log::debug!("ignoring inbound key `{}`", key);
        return false;
    }
    store.write_string(key, value);
    true
}

/// Deliver the deferred notification, if any, now that the link is ready.
/// At most one event is ever pending; older deferrals were overwritten.
pub fn link_ready<S: Store, C: CompanionLink>(store: &mut S, link: &mut C) {
    let Some(raw) = store.read_u32(storage::KEY_DEFERRED_EVENT) else {
        return;
    };
    store.delete(storage::KEY_DEFERRED_EVENT);
    match NotifyKind::from_persisted(raw) {
        Some(kind) => notify::post_event(store, link, kind),
        None => log::warn!("deferred slot held unknown event code {}", raw),
    }
}

/// The task-list entry point is offered only once the companion has
/// provided a task-service token.
pub fn task_list_available<S: Store>(store: &S) -> bool {
    store.exists(storage::KEY_TASKLIST_TOKEN)
}
