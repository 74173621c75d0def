//! Application shell around the pure `interval-core` state machine: the
//! persistent store, the wake-up scheduler binding, the companion-link
//! boundary, and the interval controller that ties them together.

pub mod alerts;
pub mod message;
pub mod notify;
pub mod storage;
pub mod track;
pub mod ui;
pub mod wakeup;
