//! # meshsim-engine::control
//!
//! Control messages the TUI (or any other interactive front-end) sends to
//! a running Driver over a `crossbeam_channel`. Kept separate from
//! `Event` — a control message expresses operator intent at "now", an
//! `Event` is a scheduled, time-ordered scenario action; the Driver turns
//! the former into the latter scheduled at the current clock time so both
//! paths produce identical, logged state transitions.

use meshsim_types::id::NodeId;

#[derive(Debug, Clone)]
pub enum ControlMsg {
    Pause,
    Resume,
    /// Run exactly one tick, then pause.
    Step,
    KillNode(NodeId),
    RestartNode(NodeId),
    InjectPartition { groups: Vec<Vec<NodeId>> },
    HealPartition,
    /// Adjust `time_scale` at runtime (1.0 = real time, 0 = as fast as possible).
    SetSpeed(f64),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Paused,
    Stepping,
    Completed,
}
