#![allow(dead_code)]

//! Hand-written collaborator fakes shared by the integration tests.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use interval_core::{Vibe, WakeupId};
use pomotrack::alerts::Haptics;
use pomotrack::message::{CompanionLink, Payload, SendError};
use pomotrack::storage::FileStore;
use pomotrack::track::{Clock, TrackController};
use pomotrack::wakeup::{ScheduleError, WakeupScheduler};

pub type TestApp = TrackController<FileStore, FakeScheduler, FakeLink, CountingHaptics, ManualClock>;

pub fn new_app(dir: &Path, scheduler: FakeScheduler, link: FakeLink, clock: ManualClock) -> TestApp {
    let store = FileStore::open(dir).expect("open store");
    TrackController::new(store, scheduler, link, CountingHaptics::default(), clock)
}

/// Settable wall clock shared between the test and the controller.
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn at(start: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, t: i64) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.get()
    }
}

/// In-memory stand-in for the wake-up facility: one pending alarm,
/// explicit firing, call counters for duplicate-detection assertions.
pub struct FakeScheduler {
    pub pending: Option<(WakeupId, i64, u32)>,
    pub next_id: WakeupId,
    pub schedule_calls: u32,
    pub cancels: Vec<WakeupId>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self {
            pending: None,
            next_id: 1,
            schedule_calls: 0,
            cancels: Vec::new(),
        }
    }

    /// Deliver the pending alarm, consuming it.
    pub fn fire(&mut self) -> Option<(WakeupId, u32)> {
        self.pending.take().map(|(id, _, reason)| (id, reason))
    }

    pub fn pending_target(&self) -> Option<i64> {
        self.pending.map(|(_, at, _)| at)
    }
}

impl WakeupScheduler for FakeScheduler {
    fn schedule(&mut self, now: i64, at: i64, reason: u32) -> Result<WakeupId, ScheduleError> {
        self.schedule_calls += 1;
        if at <= now {
            return Err(ScheduleError::NotInFuture { at, now });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.pending = Some((id, at, reason));
        Ok(id)
    }

    fn cancel(&mut self, id: WakeupId) {
        self.cancels.push(id);
        if matches!(self.pending, Some((pending, _, _)) if pending == id) {
            self.pending = None;
        }
    }

    fn query(&self, id: WakeupId) -> Option<i64> {
        self.pending.filter(|(p, _, _)| *p == id).map(|(_, at, _)| at)
    }
}

pub struct FakeLink {
    pub ready: bool,
    pub fail_sends: bool,
    pub sent: Vec<Payload>,
    pub attempts: u32,
}

impl FakeLink {
    pub fn offline() -> Self {
        Self {
            ready: false,
            fail_sends: false,
            sent: Vec::new(),
            attempts: 0,
        }
    }

    pub fn online() -> Self {
        Self {
            ready: true,
            ..Self::offline()
        }
    }
}

impl CompanionLink for FakeLink {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn send(&mut self, payload: &Payload) -> Result<(), SendError> {
        self.attempts += 1;
        if self.fail_sends {
            return Err(SendError::Transport(String::from("link dropped")));
        }
        self.sent.push(payload.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingHaptics {
    pub patterns: Vec<Vibe>,
}

impl Haptics for CountingHaptics {
    fn vibrate(&mut self, pattern: Vibe) {
        self.patterns.push(pattern);
    }
}
