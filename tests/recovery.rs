//! Process-lifecycle recovery: the app can be torn down and recreated
//! between any two operations, including being relaunched by the very
//! alarm it scheduled.

mod common;

use common::{new_app, FakeLink, FakeScheduler, ManualClock};
use interval_core::{IntervalState, Vibe};
use pomotrack::message;
use pomotrack::storage::{self, FileStore, Store};

const TOKEN: &str = "abcdefghijklmnopqrstuv"; // 22 bytes

fn configure_webhook(dir: &std::path::Path) {
    let mut store = FileStore::open(dir).expect("open store");
    message::apply_update(&mut store, storage::KEY_WEBHOOK_TOKEN, TOKEN);
    message::apply_update(&mut store, storage::KEY_EVENT_STARTED, "pomodoro_started");
    message::apply_update(&mut store, storage::KEY_EVENT_CANCELED, "pomodoro_canceled");
    message::apply_update(&mut store, storage::KEY_EVENT_FINISHED, "pomodoro_finished");
}

#[test]
fn relaunch_during_working_recovers_without_duplicate_alarm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::at(0);

    let mut app = new_app(dir.path(), FakeScheduler::new(), FakeLink::offline(), clock.clone());
    app.on_appear(None);
    app.handle_select();
    assert_eq!(app.state, IntervalState::Working);
    assert_eq!(app.scheduler.pending_target(), Some(1500));
    let scheduled_id = app.wakeup_id;

    // The process goes away; the OS keeps the alarm.
    let scheduler = app.scheduler;

    clock.set(200);
    let mut app = new_app(dir.path(), scheduler, FakeLink::offline(), clock.clone());
    app.on_appear(None);

    assert_eq!(app.state, IntervalState::Working);
    assert_eq!(app.wakeup_id, scheduled_id);
    let snap = app.snapshot();
    assert_eq!(snap.remaining_secs, 1300);
    // Exactly the original schedule call; recovery never re-schedules.
    assert_eq!(app.scheduler.schedule_calls, 1);
}

#[test]
fn launch_by_wakeup_replays_fire_into_break() {
    let dir = tempfile::tempdir().expect("tempdir");
    configure_webhook(dir.path());
    let clock = ManualClock::at(0);

    let mut app = new_app(dir.path(), FakeScheduler::new(), FakeLink::online(), clock.clone());
    app.on_appear(None);
    app.handle_select();
    let mut scheduler = app.scheduler;

    // The work alarm elapses while the process is not running; the relaunch
    // delivers the fire event into the appear hook.
    clock.set(1500);
    let fired = scheduler.fire().expect("work alarm pending");

    let mut app = new_app(dir.path(), scheduler, FakeLink::online(), clock.clone());
    app.on_appear(Some(fired));

    assert_eq!(app.state, IntervalState::Breaking);
    assert_eq!(app.scheduler.pending_target(), Some(1800));
    assert_eq!(app.haptics.patterns, vec![Vibe::Short]);
    assert_eq!(app.snapshot().remaining_secs, 300);

    // The break alarm's persisted mirror matches the live alarm.
    let (break_id, _, _) = app.scheduler.pending.expect("break alarm pending");
    assert_eq!(app.store.read_i64(storage::KEY_WAKEUP_ID), Some(break_id));

    let finished: Vec<_> = app.link.sent.iter().map(|p| p.event.as_str()).collect();
    assert_eq!(finished, vec!["pomodoro_finished"]);
}

#[test]
fn break_fire_lands_back_in_idle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::at(0);

    let mut app = new_app(dir.path(), FakeScheduler::new(), FakeLink::offline(), clock.clone());
    app.on_appear(None);
    app.handle_select();
    clock.set(1500);
    let fired = app.scheduler.fire().expect("work alarm");
    app.handle_wakeup(fired.0, fired.1);
    assert_eq!(app.state, IntervalState::Breaking);

    clock.set(1800);
    let fired = app.scheduler.fire().expect("break alarm");
    app.handle_wakeup(fired.0, fired.1);

    assert_eq!(app.state, IntervalState::Idle);
    assert_eq!(app.haptics.patterns, vec![Vibe::Short, Vibe::Long]);
    assert_eq!(app.wakeup_id, 0);
    assert_eq!(app.store.read_i64(storage::KEY_WAKEUP_ID), None);
    assert_eq!(app.store.read_u32(storage::KEY_STATE), Some(IntervalState::Idle.to_persisted()));
}

#[test]
fn paused_interval_survives_relaunch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::at(0);

    let mut app = new_app(dir.path(), FakeScheduler::new(), FakeLink::offline(), clock.clone());
    app.on_appear(None);
    app.handle_select();
    clock.set(100);
    app.handle_select(); // pause
    assert_eq!(app.state, IntervalState::Pausing);
    assert_eq!(app.store.read_u32(storage::KEY_REMAINING), Some(1400));
    let scheduler = app.scheduler;

    // Hours later, a fresh process resumes where the old one paused.
    clock.set(50_000);
    let mut app = new_app(dir.path(), scheduler, FakeLink::offline(), clock.clone());
    app.on_appear(None);
    assert_eq!(app.state, IntervalState::Pausing);
    assert_eq!(app.snapshot().remaining_secs, 1400);

    app.handle_select(); // resume
    assert_eq!(app.state, IntervalState::Working);
    assert_eq!(app.scheduler.pending_target(), Some(51_400));
    assert_eq!(app.store.read_u32(storage::KEY_REMAINING), None);
}

#[test]
fn unknown_persisted_state_falls_back_to_idle() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut store = FileStore::open(dir.path()).expect("open store");
        store.write_u32(storage::KEY_STATE, 9);
    }

    let mut app = new_app(
        dir.path(),
        FakeScheduler::new(),
        FakeLink::offline(),
        ManualClock::at(0),
    );
    app.on_appear(None);

    assert_eq!(app.state, IntervalState::Idle);
    assert_eq!(app.snapshot().remaining_secs, 1500);
}

#[test]
fn working_with_stale_handle_shows_snapshot_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut store = FileStore::open(dir.path()).expect("open store");
        store.write_u32(storage::KEY_STATE, IntervalState::Working.to_persisted());
        store.write_i64(storage::KEY_WAKEUP_ID, 7);
        store.write_u32(storage::KEY_REMAINING, 777);
    }

    // The scheduler has no record of alarm 7: it fired or was lost. The
    // display degrades to the persisted snapshot instead of asserting.
    let mut app = new_app(
        dir.path(),
        FakeScheduler::new(),
        FakeLink::offline(),
        ManualClock::at(200),
    );
    app.on_appear(None);

    assert_eq!(app.state, IntervalState::Working);
    assert_eq!(app.snapshot().remaining_secs, 777);
    assert_eq!(app.scheduler.schedule_calls, 0);
}

#[test]
fn duration_overrides_are_read_at_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut store = FileStore::open(dir.path()).expect("open store");
        store.write_u32(storage::KEY_WORK_SECS, 60);
        store.write_u32(storage::KEY_BREAK_SECS, 30);
    }

    let clock = ManualClock::at(0);
    let mut app = new_app(dir.path(), FakeScheduler::new(), FakeLink::offline(), clock);
    app.on_appear(None);

    assert_eq!(app.snapshot().remaining_secs, 60);
    app.handle_select();
    assert_eq!(app.scheduler.pending_target(), Some(60));
}
