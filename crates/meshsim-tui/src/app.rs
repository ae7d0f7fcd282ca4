//! # meshsim-tui::app
//!
//! Defines the `App` struct, which holds the state for the TUI.

use meshsim_engine::control::ControlMsg;
use meshsim_types::id::NodeId;
use meshsim_types::metrics_model::Snapshot;

/// Represents the state of the TUI application.
pub struct App {
    /// The most recently received snapshot of the simulation state.
    pub snapshot: Option<Snapshot>,
    /// Whether the help screen is visible.
    pub show_help: bool,
    /// Whether the simulation is paused.
    pub is_paused: bool,
    /// Whether log filtering is enabled.
    pub filter_logs: bool,
    /// Current focused panel index.
    pub focused_panel: usize,
    /// Channel to send control messages to the simulation engine.
    control_tx: crossbeam_channel::Sender<ControlMsg>,
    /// Selected node for operations (kill, restart, etc.).
    pub selected_node: Option<NodeId>,
}

impl App {
    pub fn new(control_tx: crossbeam_channel::Sender<ControlMsg>) -> Self {
        Self {
            snapshot: None,
            show_help: false,
            is_paused: false,
            filter_logs: false,
            focused_panel: 0,
            control_tx,
            selected_node: None,
        }
    }

    /// Called on every UI tick.
    pub fn on_tick(&mut self) {}

    /// Updates the app's state with a new snapshot from the engine.
    pub fn update_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_pause(&mut self) {
        self.is_paused = !self.is_paused;
        let msg = if self.is_paused { ControlMsg::Pause } else { ControlMsg::Resume };
        if let Err(e) = self.control_tx.send(msg) {
            eprintln!("failed to send control message: {e}");
        }
    }

    pub fn single_step(&mut self) {
        if let Err(e) = self.control_tx.send(ControlMsg::Step) {
            eprintln!("failed to send step message: {e}");
        }
    }

    /// Splits the currently known nodes roughly in half and partitions them
    /// from each other. A real operator workflow would let the user pick
    /// the groups; this is a quick demo action bound to one key.
    pub fn inject_partition(&mut self) {
        let Some(snapshot) = &self.snapshot else { return };
        let ids: Vec<NodeId> = snapshot.nodes.iter().map(|n| n.id).collect();
        if ids.len() < 2 {
            return;
        }
        let mid = ids.len() / 2;
        let groups = vec![ids[..mid].to_vec(), ids[mid..].to_vec()];
        if let Err(e) = self.control_tx.send(ControlMsg::InjectPartition { groups }) {
            eprintln!("failed to send partition message: {e}");
        }
    }

    fn target_node(&self) -> Option<NodeId> {
        self.selected_node.or_else(|| self.snapshot.as_ref().and_then(|s| s.nodes.first()).map(|n| n.id))
    }

    pub fn kill_node(&mut self) {
        let Some(id) = self.target_node() else { return };
        if let Err(e) = self.control_tx.send(ControlMsg::KillNode(id)) {
            eprintln!("failed to send kill node message: {e}");
        }
    }

    pub fn restart_node(&mut self) {
        let Some(id) = self.target_node() else { return };
        if let Err(e) = self.control_tx.send(ControlMsg::RestartNode(id)) {
            eprintln!("failed to send restart node message: {e}");
        }
    }

    pub fn toggle_filter_logs(&mut self) {
        self.filter_logs = !self.filter_logs;
    }

    pub fn cycle_focus(&mut self) {
        self.focused_panel = (self.focused_panel + 1) % 4;
    }
}
