//! Pure work/break interval logic with no platform dependencies.
//! Testable on host, driven by the pomotrack shell.
//!
//! The state machine is a single `transition` function: it takes the current
//! state, one event, and the reconciled time inputs, and returns the next
//! state plus an ordered list of effects for the caller to execute. Nothing
//! in this crate touches a clock, a store, or a scheduler.

use num_traits::{FromPrimitive, ToPrimitive};

/// Handle for an outstanding wake-up alarm. `0` means "none remembered in
/// this process instance"; the persisted mirror carries the same value.
pub type WakeupId = i64;

pub const DEFAULT_WORK_SECS: u32 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u32 = 5 * 60;

/// Fixed start angle of the progress arc, in degrees.
pub const ARC_START_DEG: f32 = 90.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum IntervalState {
    Idle = 0,
    Working = 1,
    Pausing = 2,
    Breaking = 3,
}

impl IntervalState {
    /// Decode a persisted integer. Unknown values yield `None`; callers fall
    /// back to `Idle` rather than trusting a corrupt store.
    pub fn from_persisted(raw: u32) -> Option<Self> {
        FromPrimitive::from_u32(raw)
    }

    pub fn to_persisted(self) -> u32 {
        self.to_u32().unwrap_or(0)
    }

    /// An alarm may be outstanding only while counting down.
    pub fn counts_down(self) -> bool {
        matches!(self, IntervalState::Working | IntervalState::Breaking)
    }
}

/// Webhook events raised at transition points. Persisted as integers in the
/// deferred-notification slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum NotifyKind {
    Started = 1,
    Canceled = 2,
    Finished = 3,
}

impl NotifyKind {
    pub fn from_persisted(raw: u32) -> Option<Self> {
        FromPrimitive::from_u32(raw)
    }

    pub fn to_persisted(self) -> u32 {
        self.to_u32().unwrap_or(0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Vibe {
    Short,
    Long,
}

/// The closed set of events the machine reacts to. Button-to-event mapping
/// is a presentation concern and lives in the shell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
    Start,
    Pause,
    Resume,
    Cancel,
    WakeupFired,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Durations {
    pub work_secs: u32,
    pub break_secs: u32,
}

impl Durations {
    pub fn new(work_secs: u32, break_secs: u32) -> Self {
        Self {
            work_secs,
            break_secs,
        }
    }

    /// Duration of the interval the given state is (or would be) counting.
    pub fn active_secs(&self, state: IntervalState) -> u32 {
        match state {
            IntervalState::Breaking => self.break_secs,
            _ => self.work_secs,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_SECS, DEFAULT_BREAK_SECS)
    }
}

/// The three independent time sources the machine must reconcile, gathered
/// by the caller immediately before a transition or a display read.
///
/// `wakeup_target` is the scheduler's answer for the currently tracked
/// alarm; `None` means the alarm already fired, was never scheduled, or the
/// handle is stale. `remaining` is the persisted seconds-left snapshot.
#[derive(Clone, Copy, Debug)]
pub struct Inputs {
    pub now: i64,
    pub wakeup_target: Option<i64>,
    pub remaining: Option<u32>,
    pub durations: Durations,
}

/// Side effects requested by a transition, to be executed in order.
///
/// `Schedule` asks the caller to schedule a wake-up and persist the returned
/// id in the same step; the alarm and its persisted mirror must never drift
/// apart. `CancelWakeup` cancels the currently tracked id (idempotent).
/// `ForgetWakeup` deletes the persisted id and zeroes the in-memory handle.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Effect {
    Schedule { at: i64 },
    CancelWakeup,
    ForgetWakeup,
    SaveRemaining(u32),
    ClearRemaining,
    SaveState(IntervalState),
    Notify(NotifyKind),
    Vibrate(Vibe),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Transition {
    pub next: IntervalState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: IntervalState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

/// The transition table. Unlisted `(state, event)` pairs are no-ops.
pub fn transition(state: IntervalState, event: Event, inputs: &Inputs) -> Transition {
    use IntervalState::*;

    match (state, event) {
        (Idle, Event::Start) => Transition {
            next: Working,
            effects: vec![
                Effect::Schedule {
                    at: inputs.now + i64::from(inputs.durations.work_secs),
                },
                Effect::SaveState(Working),
                Effect::Notify(NotifyKind::Started),
            ],
        },

        (Working, Event::Pause) => {
            let mut effects = Vec::new();
            // A stale handle means there is no target to snapshot; still
            // cancel and move on rather than failing the pause.
            if let Some(target) = inputs.wakeup_target {
                effects.push(Effect::SaveRemaining(clamp_secs(target - inputs.now)));
            }
            effects.push(Effect::CancelWakeup);
            effects.push(Effect::ForgetWakeup);
            effects.push(Effect::SaveState(Pausing));
            Transition {
                next: Pausing,
                effects,
            }
        }

        (Pausing, Event::Resume) => {
            let mut effects = vec![Effect::ClearRemaining];
            effects.extend(resume_effects(inputs));
            effects.push(Effect::SaveState(Working));
            Transition {
                next: Working,
                effects,
            }
        }

        (Working, Event::WakeupFired) => Transition {
            next: Breaking,
            effects: vec![
                Effect::ForgetWakeup,
                Effect::Vibrate(Vibe::Short),
                Effect::Notify(NotifyKind::Finished),
                Effect::Schedule {
                    at: inputs.now + i64::from(inputs.durations.break_secs),
                },
                Effect::SaveState(Breaking),
            ],
        },

        (Breaking, Event::WakeupFired) => Transition {
            next: Idle,
            effects: vec![
                Effect::ForgetWakeup,
                Effect::Vibrate(Vibe::Long),
                Effect::SaveState(Idle),
            ],
        },

        (Working, Event::Cancel) => Transition {
            next: Idle,
            effects: vec![
                Effect::CancelWakeup,
                Effect::ClearRemaining,
                Effect::ForgetWakeup,
                Effect::Notify(NotifyKind::Canceled),
                Effect::SaveState(Idle),
            ],
        },

        // Cancel while paused synthesizes a resume first, so cancellation
        // always goes through an outstanding-wake-up cancel instead of a
        // separate cleanup path for the no-alarm case.
        (Pausing, Event::Cancel) => {
            let mut effects = vec![Effect::ClearRemaining];
            effects.extend(resume_effects(inputs));
            effects.push(Effect::CancelWakeup);
            effects.push(Effect::ForgetWakeup);
            effects.push(Effect::Notify(NotifyKind::Canceled));
            effects.push(Effect::SaveState(Idle));
            Transition {
                next: Idle,
                effects,
            }
        }

        (Breaking, Event::Cancel) => Transition {
            next: Idle,
            effects: vec![
                Effect::CancelWakeup,
                Effect::ClearRemaining,
                Effect::ForgetWakeup,
                Effect::SaveState(Idle),
            ],
        },

        _ => Transition::stay(state),
    }
}

/// Shared by resume and cancel-from-pausing. A missing or zero snapshot is
/// clamped to one second ahead so the schedule call never violates the
/// strictly-future contract.
fn resume_effects(inputs: &Inputs) -> Vec<Effect> {
    let remaining = inputs.remaining.unwrap_or(0).max(1);
    vec![Effect::Schedule {
        at: inputs.now + i64::from(remaining),
    }]
}

fn clamp_secs(secs: i64) -> u32 {
    secs.clamp(0, i64::from(u32::MAX)) as u32
}

/// Seconds left to display for the current state.
///
/// While counting down the live scheduler target is authoritative and the
/// persisted snapshot is only a fallback for a stale handle; while paused
/// the snapshot is the only truth; while idle the display always shows the
/// full work duration and never reads the store.
pub fn remaining_secs(state: IntervalState, inputs: &Inputs) -> u32 {
    match state {
        IntervalState::Idle => inputs.durations.work_secs,
        IntervalState::Pausing => inputs.remaining.unwrap_or(0),
        IntervalState::Working | IntervalState::Breaking => match inputs.wakeup_target {
            Some(target) => clamp_secs(target - inputs.now),
            None => inputs.remaining.unwrap_or(0),
        },
    }
}

/// Fraction of the active interval already elapsed, in `0.0..=1.0`.
/// `None` while idle: no arc is drawn.
pub fn progress_fraction(
    state: IntervalState,
    remaining_secs: u32,
    durations: &Durations,
) -> Option<f32> {
    if state == IntervalState::Idle {
        return None;
    }
    let duration = durations.active_secs(state);
    if duration == 0 {
        return Some(1.0);
    }
    let elapsed = duration.saturating_sub(remaining_secs);
    let frac = elapsed as f32 / duration as f32;
    Some(if frac > 1.0 { 1.0 } else { frac })
}

/// Sweep of the progress arc from [`ARC_START_DEG`], proportional to the
/// elapsed fraction. Fully open at `remaining == duration`, fully closed at
/// `remaining == 0`.
pub fn arc_sweep_degrees(fraction: f32) -> f32 {
    fraction * 360.0
}

/// Format seconds as "MM:SS".
pub fn format_mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
