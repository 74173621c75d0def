//! The interval controller: owns the state machine context, gathers the
//! transition inputs, executes the returned effects, and recovers state
//! when the process is recreated. Every handler leaves the persisted store
//! and the live wake-up consistent before returning, because the process
//! may be evicted between any two handler invocations.

use std::time::{SystemTime, UNIX_EPOCH};

use interval_core::{
    remaining_secs, transition, Durations, Effect, Event, Inputs, IntervalState, WakeupId,
};

use crate::alerts::Haptics;
use crate::message::{self, CompanionLink};
use crate::notify;
use crate::storage::{self, Store};
use crate::wakeup::{WakeupScheduler, REASON_INTERVAL};

pub trait Clock {
    /// Wall-clock time, unix seconds.
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Read-only view the presentation adapter pulls on every tick and after
/// every transition. It never drives transitions itself.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub state: IntervalState,
    pub remaining_secs: u32,
    pub durations: Durations,
    pub task_list_available: bool,
}

pub struct TrackController<S, W, C, H, K>
where
    S: Store,
    W: WakeupScheduler,
    C: CompanionLink,
    H: Haptics,
    K: Clock,
{
    pub store: S,
    pub scheduler: W,
    pub link: C,
    pub haptics: H,
    pub clock: K,
    pub state: IntervalState,
    pub wakeup_id: WakeupId,
    pub durations: Durations,
}

impl<S, W, C, H, K> TrackController<S, W, C, H, K>
where
    S: Store,
    W: WakeupScheduler,
    C: CompanionLink,
    H: Haptics,
    K: Clock,
{
    pub fn new(store: S, scheduler: W, link: C, haptics: H, clock: K) -> Self {
        let durations = Durations::new(
            store
                .read_u32(storage::KEY_WORK_SECS)
                .unwrap_or(interval_core::DEFAULT_WORK_SECS),
            store
                .read_u32(storage::KEY_BREAK_SECS)
                .unwrap_or(interval_core::DEFAULT_BREAK_SECS),
        );
        Self {
            store,
            scheduler,
            link,
            haptics,
            clock,
            state: IntervalState::Idle,
            wakeup_id: 0,
            durations,
        }
    }

    /// Startup recovery. Runs on every process start before any tick or
    /// click handler, not only on first creation: the process can be
    /// recreated many times while the interval is logically still running.
    ///
    /// `launch` carries the wake-up event when this very start was caused
    /// by a firing alarm; otherwise the persisted handle is recovered and
    /// the pending alarm is left alone (no duplicate gets scheduled).
    pub fn on_appear(&mut self, launch: Option<(WakeupId, u32)>) {
        self.state = match self.store.read_u32(storage::KEY_STATE) {
            None => IntervalState::Idle,
            Some(raw) => match IntervalState::from_persisted(raw) {
                Some(state) => state,
                None => {
                    log::warn!("persisted state {} is unknown, treating as idle", raw);
                    IntervalState::Idle
                }
            },
        };

        match launch {
            Some((id, reason)) => self.handle_wakeup(id, reason),
            None => {
                if self.wakeup_id == 0 {
                    self.wakeup_id = self.store.read_i64(storage::KEY_WAKEUP_ID).unwrap_or(0);
                }
            }
        }
    }

    /// Select button: start, pause or resume depending on the state. During
    /// a break the button does nothing; the break runs out on its own.
    pub fn handle_select(&mut self) {
        let event = match self.state {
            IntervalState::Idle => Event::Start,
            IntervalState::Working => Event::Pause,
            IntervalState::Pausing => Event::Resume,
            IntervalState::Breaking => return,
        };
        self.dispatch(event);
    }

    pub fn handle_cancel(&mut self) {
        self.dispatch(Event::Cancel);
    }

    /// A wake-up fired, either while running or replayed right after a
    /// relaunch. The id and reason are logged but otherwise opaque; the
    /// current state alone decides what happens.
    pub fn handle_wakeup(&mut self, id: WakeupId, reason: u32) {
        if reason != REASON_INTERVAL {
            log::warn!("wake-up {} carries foreign reason {}", id, reason);
        }
        self.dispatch(Event::WakeupFired);
    }

    pub fn snapshot(&mut self) -> Snapshot {
        let inputs = self.gather_inputs();
        Snapshot {
            state: self.state,
            remaining_secs: remaining_secs(self.state, &inputs),
            durations: self.durations,
            task_list_available: message::task_list_available(&self.store),
        }
    }

    /// Whether an interval is counting down (and the display needs ticks).
    pub fn is_counting(&self) -> bool {
        self.state.counts_down()
    }

    fn dispatch(&mut self, event: Event) {
        let inputs = self.gather_inputs();
        let outcome = transition(self.state, event, &inputs);
        log::info!(
            "{:?} + {:?} -> {:?} ({} effects)",
            self.state,
            event,
            outcome.next,
            outcome.effects.len()
        );
        self.state = outcome.next;
        for effect in outcome.effects {
            self.apply(effect);
        }
    }

    /// Reconcile the three time sources: wall clock, the scheduler's view
    /// of the tracked alarm, and the persisted remaining snapshot. The live
    /// query comes first; the snapshot is only the stale-handle fallback.
    fn gather_inputs(&mut self) -> Inputs {
        if self.wakeup_id == 0 {
            self.wakeup_id = self.store.read_i64(storage::KEY_WAKEUP_ID).unwrap_or(0);
        }
        let wakeup_target = if self.wakeup_id != 0 {
            self.scheduler.query(self.wakeup_id)
        } else {
            None
        };
        Inputs {
            now: self.clock.now(),
            wakeup_target,
            remaining: self.store.read_u32(storage::KEY_REMAINING),
            durations: self.durations,
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule { at } => {
                let now = self.clock.now();
                match self.scheduler.schedule(now, at, REASON_INTERVAL) {
                    Ok(id) => {
                        // The alarm and its persisted mirror are written in
                        // the same step; they must never drift apart.
                        self.wakeup_id = id;
                        self.store.write_i64(storage::KEY_WAKEUP_ID, id);
                    }
                    Err(e) => log::warn!("wake-up not scheduled: {}", e),
                }
            }
            Effect::CancelWakeup => self.scheduler.cancel(self.wakeup_id),
            Effect::ForgetWakeup => {
                self.wakeup_id = 0;
                self.store.delete(storage::KEY_WAKEUP_ID);
            }
            Effect::SaveRemaining(secs) => self.store.write_u32(storage::KEY_REMAINING, secs),
            Effect::ClearRemaining => self.store.delete(storage::KEY_REMAINING),
            Effect::SaveState(state) => self
                .store
                .write_u32(storage::KEY_STATE, state.to_persisted()),
            Effect::Notify(kind) => notify::post_event(&mut self.store, &mut self.link, kind),
            Effect::Vibrate(pattern) => self.haptics.vibrate(pattern),
        }
    }
}
