//! One-shot wake-up alarms. The trait is the contract the interval
//! controller consumes; `HostScheduler` is the host-side binding that
//! persists its single pending alarm so a relaunched process can both
//! recover the handle and replay a fire that happened while it was gone.

use interval_core::WakeupId;

use crate::storage::Store;

/// Reason tag attached to every interval alarm. The fired handler treats it
/// as opaque.
pub const REASON_INTERVAL: u32 = 1;

// Scheduler-private keys, kept apart from the interval bookkeeping keys.
const KEY_ALARM_ID: &str = "alarm_id";
const KEY_ALARM_AT: &str = "alarm_at";
const KEY_ALARM_REASON: &str = "alarm_reason";
const KEY_ALARM_NEXT_ID: &str = "alarm_next_id";

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("wake-up target {at} is not in the future (now {now})")]
    NotInFuture { at: i64, now: i64 },
}

/// Contract of the wake-up facility. Scheduling always requests relaunch on
/// fire; the interval must survive the app being evicted from memory.
pub trait WakeupScheduler {
    /// Schedule a one-shot alarm at absolute timestamp `at`. Fails if `at`
    /// is not strictly after `now`.
    fn schedule(&mut self, now: i64, at: i64, reason: u32) -> Result<WakeupId, ScheduleError>;

    /// Cancel a pending alarm. Unknown or already-fired ids are a no-op.
    fn cancel(&mut self, id: WakeupId);

    /// Target timestamp of a pending alarm, or `None` if the id is stale
    /// (already fired, canceled, or never valid).
    fn query(&self, id: WakeupId) -> Option<i64>;
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    id: WakeupId,
    at: i64,
    reason: u32,
}

/// Store-backed scheduler managing the app's single outstanding alarm.
pub struct HostScheduler<S: Store> {
    store: S,
    pending: Option<Pending>,
    next_id: WakeupId,
}

impl<S: Store> HostScheduler<S> {
    /// Reload any alarm a previous process instance left behind.
    pub fn restore(store: S) -> Self {
        let pending = match (
            store.read_i64(KEY_ALARM_ID),
            store.read_i64(KEY_ALARM_AT),
        ) {
            (Some(id), Some(at)) if id != 0 => Some(Pending {
                id,
                at,
                reason: store.read_u32(KEY_ALARM_REASON).unwrap_or(REASON_INTERVAL),
            }),
            _ => None,
        };
        // Ids stay unique across relaunches so a stale handle can never
        // match a newly scheduled alarm.
        let next_id = store.read_i64(KEY_ALARM_NEXT_ID).unwrap_or(1);
        Self {
            store,
            pending,
            next_id,
        }
    }

    /// Pop the pending alarm if its target has been reached. Called once at
    /// startup (the launched-by-wakeup replay) and on every pump tick while
    /// running.
    pub fn pop_fired(&mut self, now: i64) -> Option<(WakeupId, u32)> {
        let pending = self.pending?;
        if pending.at > now {
            return None;
        }
        self.clear_pending();
        log::info!("wake-up {} fired (reason {})", pending.id, pending.reason);
        Some((pending.id, pending.reason))
    }

    fn save_pending(&mut self, pending: Pending) {
        self.pending = Some(pending);
        self.store.write_i64(KEY_ALARM_ID, pending.id);
        self.store.write_i64(KEY_ALARM_AT, pending.at);
        self.store.write_u32(KEY_ALARM_REASON, pending.reason);
    }

    fn clear_pending(&mut self) {
        self.pending = None;
        self.store.delete(KEY_ALARM_ID);
        self.store.delete(KEY_ALARM_AT);
        self.store.delete(KEY_ALARM_REASON);
    }
}

impl<S: Store> WakeupScheduler for HostScheduler<S> {
    fn schedule(&mut self, now: i64, at: i64, reason: u32) -> Result<WakeupId, ScheduleError> {
        if at <= now {
            return Err(ScheduleError::NotInFuture { at, now });
        }
        if let Some(old) = self.pending {
            // One outstanding timed event at a time; a second schedule
            // replaces the first rather than queueing behind it.
            log::warn!("replacing pending wake-up {} (target {})", old.id, old.at);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.store.write_i64(KEY_ALARM_NEXT_ID, self.next_id);
        self.save_pending(Pending { id, at, reason });
        Ok(id)
    }

    fn cancel(&mut self, id: WakeupId) {
        match self.pending {
            Some(pending) if pending.id == id => self.clear_pending(),
            _ => {}
        }
    }

    fn query(&self, id: WakeupId) -> Option<i64> {
        self.pending.filter(|p| p.id == id).map(|p| p.at)
    }
}
