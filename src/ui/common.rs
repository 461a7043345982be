//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, notification banner, status
//! bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::RoomStatus;

/// Render the header bar with aggregate statistics.
///
/// Displays: status indicator, room count, averages, leaks and alert count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    if app.aggregator.room_count() == 0 {
        let line = Line::from(vec![
            Span::styled(" ROOMWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("│ Waiting for readings..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let stats = app.aggregator.compute_stats();
    let alerting = app
        .aggregator
        .rooms()
        .filter(|(_, _, status)| *status == RoomStatus::Alerting)
        .count();

    let overall = if alerting > 0 {
        RoomStatus::Alerting
    } else {
        RoomStatus::Normal
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(overall)),
        Span::styled("ROOMWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format!("{}", stats.room_count),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" rooms │ avg "),
        Span::styled(
            format!("{:.1}°C", stats.avg_temperature),
            Style::default().fg(app.theme.temperature),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:.1}%", stats.avg_humidity),
            Style::default().fg(app.theme.humidity),
        ),
        Span::raw(" │ "),
        if stats.leaks > 0 {
            Span::styled(
                format!("{} leaks", stats.leaks),
                Style::default().fg(app.theme.leak).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0 leaks", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" │ "),
        if stats.active_alerts > 0 {
            Span::styled(
                format!("{} alerts", stats.active_alerts),
                Style::default().fg(app.theme.alerting),
            )
        } else {
            Span::styled("0 alerts", Style::default().add_modifier(Modifier::DIM))
        },
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar, highlighting the active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let alert_count = app.aggregator.alerts().len();
    let titles: Vec<Line> = vec![
        Line::from(" 1:Overview "),
        Line::from(" 2:Trends "),
        Line::from(format!(" 3:Alerts ({}) ", alert_count)),
    ];

    let selected = match app.current_view {
        View::Overview => 0,
        View::Trends => 1,
        View::Alerts => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Rows needed by the notification banner.
pub fn notification_height(app: &App) -> u16 {
    if app.aggregator.notification().is_some() {
        1
    } else {
        0
    }
}

/// Render the active notification, if any.
pub fn render_notification(frame: &mut Frame, app: &App, area: Rect) {
    let Some(alert) = app.aggregator.notification() else {
        return;
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", alert.message),
            Style::default()
                .fg(app.theme.alerting)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("at {} ", alert.timestamp.format("%H:%M:%S")),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::styled("[d:dismiss]", Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows the source, time since the last batch and the view's controls.
/// Temporary status messages and source errors take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if app.input_active {
        let prompt = format!(" threshold> {}_  (Enter:apply Esc:cancel)", app.threshold_input);
        let paragraph = Paragraph::new(prompt).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Overview => "↑↓:room m:metric +/-:limit t:type s:save ?:help q:quit",
        View::Trends => "↑↓:room [/]:window m:metric ?:help q:quit",
        View::Alerts => "↑↓:scroll d:dismiss e:export ?:help q:quit",
    };

    let status = if let Some(ref err) = app.load_error {
        format!(" {} | Error: {} | {}", app.source_description(), err, controls)
    } else if let Some(updated) = app.last_update {
        let rejected = if app.rejected_total > 0 {
            format!(" | {} rejected", app.rejected_total)
        } else {
            String::new()
        };
        format!(
            " {} | Updated {:.1}s ago{} | {}",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
            rejected,
            controls,
        )
    } else {
        format!(" {} | Waiting... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  1/2/3       Jump to view"),
        Line::from("  ↑/↓ j/k     Select room"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        section(" Thresholds"),
        Line::from("  m           Toggle temp/humidity"),
        Line::from("  + / -       Raise/lower limit"),
        Line::from("  t           Type Room.field=value"),
        Line::from("  s           Save thresholds"),
        Line::from(""),
        section(" General"),
        Line::from("  [ / ]       Shrink/grow chart window"),
        Line::from("  d / Esc     Dismiss notification"),
        Line::from("  r           Poll source now"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 26u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
