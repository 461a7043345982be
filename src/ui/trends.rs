//! Trends view rendering.
//!
//! Plots the selected room's last `chart_window` readings, one chart per
//! metric, with the room's limit drawn as a flat line.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};
use roomwatch_types::Metric;

use crate::app::App;
use crate::data::RoomHistory;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(room) = app.selected_room() else {
        let block = Block::default()
            .title(" Trends ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new("No readings yet").block(block);
        frame.render_widget(paragraph, area);
        return;
    };
    let Some(history) = app.aggregator.history(room) else {
        return;
    };

    let chunks =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);

    for (metric, chunk) in Metric::ALL.into_iter().zip(chunks.iter()) {
        render_metric(frame, app, room, history, metric, *chunk);
    }
}

fn render_metric(
    frame: &mut Frame,
    app: &App,
    room: &str,
    history: &RoomHistory,
    metric: Metric,
    area: Rect,
) {
    let points = chart_points(history, metric, app.chart_window);
    let limit = app
        .aggregator
        .thresholds()
        .get(room)
        .and_then(|t| t.get(metric));

    let x_max = (app.chart_window.saturating_sub(1)).max(1) as f64;
    let (y_min, y_max) = y_bounds(&points, limit);

    let limit_line: Vec<(f64, f64)> = limit.map(|l| vec![(0.0, l), (x_max, l)]).unwrap_or_default();

    let color = app.theme.metric_color(metric);
    let mut datasets = vec![Dataset::default()
        .name(metric.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];
    if !limit_line.is_empty() {
        datasets.push(
            Dataset::default()
                .name("limit")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.alerting))
                .data(&limit_line),
        );
    }

    let selected = metric == app.selected_metric;
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", room),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "{} ({}) last {} ",
            metric,
            metric.unit(),
            points.len()
        )),
    ]);
    let border_style = if selected {
        Style::default().fg(app.theme.highlight)
    } else {
        Style::default().fg(app.theme.border)
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(border_style),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().add_modifier(Modifier::DIM))
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().add_modifier(Modifier::DIM))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Readings of one metric as `(index, value)`, oldest at x = 0.
fn chart_points(history: &RoomHistory, metric: Metric, window: usize) -> Vec<(f64, f64)> {
    history
        .values(metric, window)
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i as f64, v))
        .collect()
}

/// Y-axis bounds covering every point and the limit, with some headroom.
fn y_bounds(points: &[(f64, f64)], limit: Option<f64>) -> (f64, f64) {
    let values = points.iter().map(|&(_, y)| y).chain(limit);
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(1.0);
    ((min - pad).floor(), (max + pad).ceil())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomwatch_types::Reading;

    #[test]
    fn points_follow_window() {
        let mut history = RoomHistory::new(20);
        for t in [20.0, 21.0, 22.0, 23.0] {
            history.push(Reading::builder("A").temperature(t).humidity(50.0).build());
        }
        let points = chart_points(&history, Metric::Temperature, 3);
        assert_eq!(points, vec![(0.0, 21.0), (1.0, 22.0), (2.0, 23.0)]);
    }

    #[test]
    fn bounds_include_limit() {
        let (lo, hi) = y_bounds(&[(0.0, 20.0), (1.0, 22.0)], Some(28.0));
        assert!(lo <= 20.0);
        assert!(hi >= 28.0);
    }

    #[test]
    fn bounds_without_data() {
        assert_eq!(y_bounds(&[], None), (0.0, 1.0));
        let (lo, hi) = y_bounds(&[], Some(30.0));
        assert!(lo < 30.0 && hi > 30.0);
    }
}
