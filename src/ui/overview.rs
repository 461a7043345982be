//! Overview rendering.
//!
//! Displays a table of all rooms with their latest reading, configured
//! limits, a trend sparkline and alert status.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};
use roomwatch_types::{Metric, Threshold};

use crate::app::App;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Width of the trend column, in readings.
const TREND_WIDTH: usize = 10;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let metric = app.selected_metric;

    let header = Row::new(vec![
        Cell::from("Room"),
        Cell::from("Temp"),
        Cell::from("Humidity"),
        Cell::from("Leak"),
        Cell::from("Limits"),
        Cell::from(format!("Trend ({})", metric.field_name())),
        Cell::from("Status"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = app
        .aggregator
        .rooms()
        .map(|(room, history, status)| {
            let threshold = app.aggregator.thresholds().get(room);
            let latest = history.latest();

            let value_cell = |m: Metric| -> Cell<'static> {
                let Some(reading) = latest else {
                    return Cell::from("-");
                };
                let value = reading.value(m);
                let text = format!(
                    "{:.1}{} {}",
                    value,
                    m.unit(),
                    format_delta(history.delta(m))
                );
                let over = threshold.is_some_and(|t| t.is_exceeded(m, value));
                let style = if over {
                    Style::default()
                        .fg(app.theme.alerting)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Cell::from(text).style(style)
            };

            let leak = match latest {
                Some(r) if r.leak_detected() => Cell::from("LEAK").style(
                    Style::default()
                        .fg(app.theme.leak)
                        .add_modifier(Modifier::BOLD),
                ),
                Some(_) => Cell::from("dry"),
                None => Cell::from("-"),
            };

            let window = app.chart_window.min(TREND_WIDTH);
            let sparkline = render_sparkline(&history.sparkline(metric, window), window);

            Row::new(vec![
                Cell::from(room.to_string()),
                value_cell(Metric::Temperature),
                value_cell(Metric::Humidity),
                leak,
                Cell::from(format_limits(threshold)),
                Cell::from(sparkline).style(Style::default().fg(app.theme.metric_color(metric))),
                Cell::from(status.symbol()).style(app.theme.status_style(status)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(5),
        Constraint::Fill(2),
        Constraint::Min(TREND_WIDTH as u16 + 2),
        Constraint::Min(6),
    ];

    let room_count = app.aggregator.room_count();
    let selected = app.selected_room_index.min(room_count.saturating_sub(1));

    let position_info = if room_count > 0 {
        format!(" [{}/{}]", selected + 1, room_count)
    } else {
        String::new()
    };
    let title = format!(" Rooms ({}){} ", room_count, position_info);

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
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Arrow for the change since the previous reading.
fn format_delta(delta: Option<f64>) -> &'static str {
    match delta {
        Some(d) if d > 0.05 => "↑",
        Some(d) if d < -0.05 => "↓",
        Some(_) => "→",
        None => " ",
    }
}

fn format_limits(threshold: Option<&Threshold>) -> String {
    let Some(t) = threshold else {
        return "-".to_string();
    };
    let part = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into());
    format!("{} / {}", part(t.temp), part(t.humidity))
}

fn render_sparkline(data: &[u8], width: usize) -> String {
    if data.is_empty() {
        return " ".repeat(width);
    }

    let values: Vec<u8> = data.iter().rev().take(width).rev().copied().collect();
    values.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}
