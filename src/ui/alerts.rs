//! Alert history view.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Render the alert history, newest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = app.aggregator.alerts();

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Room"),
        Cell::from("Metric"),
        Cell::from("Limit"),
        Cell::from("Message"),
    ])
    .height(1)
    .style(app.theme.header);

    let active = app.aggregator.notification();
    let rows: Vec<Row> = alerts
        .iter()
        .rev()
        .map(|alert| {
            let style = if active == Some(alert) {
                Style::default().fg(app.theme.alerting)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(alert.timestamp.format("%H:%M:%S").to_string()),
                Cell::from(alert.room.clone()),
                Cell::from(alert.metric.to_string())
                    .style(Style::default().fg(app.theme.metric_color(alert.metric))),
                Cell::from(format!("{:.1}{}", alert.limit, alert.metric.unit())),
                Cell::from(alert.message.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Fill(5),
    ];

    let selected = app.selected_alert_index.min(alerts.len().saturating_sub(1));
    let title = if alerts.is_empty() {
        " Alerts (none) ".to_string()
    } else {
        format!(" Alerts [{}/{}] ", selected + 1, alerts.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !alerts.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
