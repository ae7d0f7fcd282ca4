//! # meshsim-tui::ui::widgets::status
//!
//! Renders the status bar and the node status grid.

use crate::{app::App, theme};
use ratatui::{prelude::*, widgets::*};

pub fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let time_str = app.snapshot.as_ref().map(|s| format!("{}ms", s.sim_time)).unwrap_or_else(|| "N/A".to_string());

    let text = Line::from(vec![
        Span::styled(" meshsim ", Style::new().bg(Color::Cyan).fg(Color::Black)),
        Span::raw(" | "),
        Span::styled(time_str, Style::new().fg(Color::Green)),
        Span::raw(" | Press '?' for help, 'q' to quit"),
    ]);
    f.render_widget(Paragraph::new(text), area);
}

pub fn draw_node_status_grid(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Node Status ")
        .borders(Borders::ALL)
        .border_style(theme::BORDER_STYLE);

    let Some(snapshot) = &app.snapshot else {
        f.render_widget(block, area);
        return;
    };

    let rows = snapshot.nodes.iter().map(|node| {
        let status_style = if node.running { Style::new().fg(Color::Green) } else { Style::new().fg(Color::Red) };
        let status_text = if node.running { "running" } else { "down" };

        Row::new(vec![
            Cell::from(node.id.to_string()),
            Cell::from(node.alias.clone()),
            Cell::from(status_text).style(status_style),
            Cell::from(node.partition_id.to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Min(8),
        ],
    )
    .header(Row::new(vec!["ID", "Alias", "Status", "Partition"]).style(theme::TITLE_STYLE))
    .block(block);

    f.render_widget(table, area);
}
