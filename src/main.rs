use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::time::Duration;

use pomotrack::alerts::LogHaptics;
use pomotrack::message::NullLink;
use pomotrack::storage::FileStore;
use pomotrack::track::{Clock, SystemClock, TrackController};
use pomotrack::ui;
use pomotrack::wakeup::HostScheduler;

const PUMP_INTERVAL_MS: u64 = 1000;

enum AppEvent {
    Key(char),
    Pump,
}

enum PumpCtl {
    Start(u64),
    Stop,
    Quit,
}

/// Periodic tick source, started only while an interval is counting down.
/// Mirrors the device's one-second display pump.
fn pump_thread(ctl: mpsc::Receiver<PumpCtl>, events: mpsc::Sender<AppEvent>) {
    let mut interval_ms = PUMP_INTERVAL_MS;
    let mut running = false;

    loop {
        let msg = if running {
            match ctl.recv_timeout(Duration::from_millis(interval_ms)) {
                Ok(msg) => Some(msg),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if events.send(AppEvent::Pump).is_err() {
                        break;
                    }
                    None
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match ctl.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            }
        };

        match msg {
            Some(PumpCtl::Start(ms)) => {
                interval_ms = if ms == 0 { PUMP_INTERVAL_MS } else { ms };
                running = true;
            }
            Some(PumpCtl::Stop) => running = false,
            Some(PumpCtl::Quit) => break,
            None => {}
        }
    }
}

fn key_thread(events: mpsc::Sender<AppEvent>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let key = line.chars().next().unwrap_or('\n');
        if events.send(AppEvent::Key(key)).is_err() {
            break;
        }
    }
}

fn data_dir() -> String {
    std::env::var("POMOTRACK_DATA").unwrap_or_else(|_| String::from("pomotrack-data"))
}

fn main() {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .expect("can't parse log spec")
        .start()
        .expect("can't start logger");

    let dir = data_dir();
    let store = FileStore::open(&dir).expect("can't open data store");
    let scheduler =
        HostScheduler::restore(FileStore::open(&dir).expect("can't open scheduler store"));
    let clock = SystemClock;

    let mut app = TrackController::new(store, scheduler, NullLink, LogHaptics, clock);

    // Recovery must finish before the loop services its first tick or key:
    // replay a wake-up that elapsed while the process was gone, or recover
    // the still-pending handle.
    let launch = app.scheduler.pop_fired(app.clock.now());
    app.on_appear(launch);

    let (event_tx, event_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    let pump_events = event_tx.clone();
    std::thread::spawn(move || pump_thread(pump_rx, pump_events));
    std::thread::spawn(move || key_thread(event_tx));

    let mut pump_running = false;
    sync_pump(&pump_tx, &mut pump_running, app.is_counting());
    redraw(&mut app);

    loop {
        let Ok(event) = event_rx.recv() else { break };
        match event {
            AppEvent::Key(key) => match key {
                '\r' | '\n' | 's' => app.handle_select(),
                'c' | 'd' => app.handle_cancel(),
                't' => {
                    if app.snapshot().task_list_available {
                        log::info!("task list requested");
                    }
                }
                'q' => break,
                _ => {}
            },
            AppEvent::Pump => {
                if let Some((id, reason)) = app.scheduler.pop_fired(app.clock.now()) {
                    app.handle_wakeup(id, reason);
                }
            }
        }
        sync_pump(&pump_tx, &mut pump_running, app.is_counting());
        redraw(&mut app);
    }

    pump_tx.send(PumpCtl::Quit).ok();
    println!();
}

fn sync_pump(pump_tx: &mpsc::Sender<PumpCtl>, running: &mut bool, want: bool) {
    if want && !*running {
        pump_tx.send(PumpCtl::Start(PUMP_INTERVAL_MS)).ok();
        *running = true;
    } else if !want && *running {
        pump_tx.send(PumpCtl::Stop).ok();
        *running = false;
    }
}

fn redraw(
    app: &mut TrackController<
        FileStore,
        HostScheduler<FileStore>,
        NullLink,
        LogHaptics,
        SystemClock,
    >,
) {
    let model = ui::build(&app.snapshot());
    print!("\r\x1b[2K{}", ui::render_line(&model));
    std::io::stdout().flush().ok();
}
