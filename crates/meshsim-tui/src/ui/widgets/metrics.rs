//! # meshsim-tui::ui::widgets::metrics
//!
//! Renders aggregate message/byte counters across every node in the latest
//! snapshot.

use crate::{app::App, theme};
use ratatui::{prelude::*, widgets::*};

pub fn draw_metrics_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Metrics ")
        .borders(Borders::ALL)
        .border_style(theme::BORDER_STYLE);

    let Some(snapshot) = &app.snapshot else {
        f.render_widget(block, area);
        return;
    };

    let sent: u64 = snapshot.nodes.iter().map(|n| n.messages_sent).sum();
    let received: u64 = snapshot.nodes.iter().map(|n| n.messages_received).sum();
    let bytes_sent: u64 = snapshot.nodes.iter().map(|n| n.bytes_sent).sum();
    let running = snapshot.nodes.iter().filter(|n| n.running).count();

    let lines = vec![
        Line::from(format!("sim_time: {}ms", snapshot.sim_time)),
        Line::from(format!("nodes running: {}/{}", running, snapshot.nodes.len())),
        Line::from(format!("messages sent: {sent}")),
        Line::from(format!("messages received: {received}")),
        Line::from(format!("bytes sent: {bytes_sent}")),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}
