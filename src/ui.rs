//! Presentation adapter. Turns a controller snapshot into countdown text
//! and a progress-arc spec; the terminal rendering below stands in for the
//! device's radial drawing call.

use interval_core::{
    arc_sweep_degrees, format_mmss, progress_fraction, IntervalState, ARC_START_DEG,
};

use crate::track::Snapshot;

/// Radial fill: fixed start angle, sweep proportional to elapsed fraction.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ArcSpec {
    pub start_deg: f32,
    pub sweep_deg: f32,
}

pub struct DisplayModel {
    pub state_label: &'static str,
    pub time_text: String,
    pub arc: Option<ArcSpec>,
    pub hint: &'static str,
    pub task_list_available: bool,
}

pub fn build(snapshot: &Snapshot) -> DisplayModel {
    let arc = progress_fraction(snapshot.state, snapshot.remaining_secs, &snapshot.durations)
        .map(|fraction| ArcSpec {
            start_deg: ARC_START_DEG,
            sweep_deg: arc_sweep_degrees(fraction),
        });

    DisplayModel {
        state_label: state_label(snapshot.state),
        time_text: format_mmss(snapshot.remaining_secs),
        arc,
        hint: hint(snapshot.state),
        task_list_available: snapshot.task_list_available,
    }
}

fn state_label(state: IntervalState) -> &'static str {
    match state {
        IntervalState::Idle => "idle",
        IntervalState::Working => "work",
        IntervalState::Pausing => "paused",
        IntervalState::Breaking => "break",
    }
}

fn hint(state: IntervalState) -> &'static str {
    match state {
        IntervalState::Idle => "enter=start  q=quit",
        IntervalState::Working => "enter=pause  c=cancel",
        IntervalState::Pausing => "enter=resume  c=cancel",
        IntervalState::Breaking => "c=cancel",
    }
}

/// Single status line, e.g. `[work  ] 21:41  [#####...............]  enter=pause  c=cancel`.
pub fn render_line(model: &DisplayModel) -> String {
    let mut line = format!("[{:<6}] {}", model.state_label, model.time_text);
    if let Some(arc) = model.arc {
        line.push_str("  [");
        let cells = 20usize;
        let filled = ((arc.sweep_deg / 360.0) * cells as f32).round() as usize;
        for i in 0..cells {
            line.push(if i < filled.min(cells) { '#' } else { '.' });
        }
        line.push(']');
    }
    line.push_str("  ");
    line.push_str(model.hint);
    if model.task_list_available {
        line.push_str("  t=tasks");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use interval_core::Durations;

    fn snapshot(state: IntervalState, remaining_secs: u32) -> Snapshot {
        Snapshot {
            state,
            remaining_secs,
            durations: Durations::new(1500, 300),
            task_list_available: false,
        }
    }

    #[test]
    fn idle_renders_no_arc() {
        let model = build(&snapshot(IntervalState::Idle, 1500));
        assert!(model.arc.is_none());
        assert_eq!(model.time_text, "25:00");
    }

    #[test]
    fn fresh_interval_renders_open_arc() {
        let model = build(&snapshot(IntervalState::Working, 1500));
        let arc = model.arc.expect("arc while working");
        assert_eq!(arc.start_deg, ARC_START_DEG);
        assert_eq!(arc.sweep_deg, 0.0);
    }

    #[test]
    fn elapsed_interval_renders_closed_arc() {
        let model = build(&snapshot(IntervalState::Working, 0));
        let arc = model.arc.expect("arc while working");
        assert_eq!(arc.sweep_deg, 360.0);
    }

    #[test]
    fn render_line_contains_countdown() {
        let model = build(&snapshot(IntervalState::Working, 1301));
        let line = render_line(&model);
        assert!(line.contains("21:41"));
        assert!(line.contains("work"));
    }

    #[test]
    fn task_gate_shows_in_hint() {
        let mut snap = snapshot(IntervalState::Idle, 1500);
        snap.task_list_available = true;
        assert!(render_line(&build(&snap)).contains("t=tasks"));
    }
}
