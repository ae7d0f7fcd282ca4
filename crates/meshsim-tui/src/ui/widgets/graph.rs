//! # meshsim-tui::ui::widgets::graph
//!
//! Renders a text summary of the current mesh topology: one line per active
//! link with its running-mean latency. A full force-directed layout is out
//! of scope for a terminal widget; this gives an operator the same
//! information in list form.

use crate::{app::App, theme};
use ratatui::{prelude::*, widgets::*};

pub fn draw_graph(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Links ")
        .borders(Borders::ALL)
        .border_style(theme::BORDER_STYLE);

    let Some(snapshot) = &app.snapshot else {
        f.render_widget(block, area);
        return;
    };

    if snapshot.links.is_empty() {
        let text = Paragraph::new("no active links").alignment(Alignment::Center).block(block);
        f.render_widget(text, area);
        return;
    }

    let lines: Vec<Line> = snapshot
        .links
        .iter()
        .map(|link| {
            Line::from(format!(
                "{} -> {}  latency~{:.1}ms  delivered={} dropped={}",
                link.from, link.to, link.latency_mean_ms, link.messages_delivered, link.messages_dropped_loss
            ))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}
