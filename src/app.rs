//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use roomwatch_types::Metric;

use crate::data::{Aggregator, ThresholdStore, ThresholdUpdate};
use crate::source::ReadingSource;
use crate::ui::Theme;

/// Upper bound on batches drained per refresh, so a flooded source cannot
/// starve the render loop.
pub const MAX_BATCHES_PER_REFRESH: usize = 64;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// One row per room: latest values, thresholds, status and sparklines.
    Overview,
    /// Charts of the selected room's recent readings.
    Trends,
    /// The alert history, newest first.
    Alerts,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Trends,
            View::Trends => View::Alerts,
            View::Alerts => View::Overview,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Alerts,
            View::Trends => View::Overview,
            View::Alerts => View::Trends,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Trends => "Trends",
            View::Alerts => "Alerts",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    source: Box<dyn ReadingSource>,
    pub aggregator: Aggregator,
    pub load_error: Option<String>,
    pub last_update: Option<Instant>,
    /// Entries dropped by decoding or validation since start.
    pub rejected_total: usize,

    // Navigation
    pub selected_room_index: usize,
    pub selected_alert_index: usize,
    pub selected_metric: Metric,
    pub chart_window: usize,

    // Typed threshold update
    pub threshold_input: String,
    pub input_active: bool,

    store: Option<Box<dyn ThresholdStore>>,

    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(source: Box<dyn ReadingSource>, aggregator: Aggregator) -> Self {
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            source,
            aggregator,
            load_error: None,
            last_update: None,
            rejected_total: 0,
            selected_room_index: 0,
            selected_alert_index: 0,
            selected_metric: Metric::Temperature,
            chart_window: 10,
            threshold_input: String::new(),
            input_active: false,
            store: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Persist threshold changes to `store` when saving.
    pub fn with_store(mut self, store: Box<dyn ThresholdStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_chart_window(mut self, window: usize) -> Self {
        self.chart_window = window.clamp(2, self.aggregator.history_size().max(2));
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// The current status message, if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Drain pending batches from the source into the aggregator.
    ///
    /// Returns the number of batches ingested.
    pub fn reload_data(&mut self) -> usize {
        let mut ingested = 0;
        while ingested < MAX_BATCHES_PER_REFRESH {
            let Some(batch) = self.source.poll() else {
                break;
            };
            let report = self.aggregator.ingest_decoded(batch);
            self.rejected_total += report.rejected.len();
            ingested += 1;
        }

        if ingested > 0 {
            self.last_update = Some(Instant::now());
        }
        self.load_error = self.source.error();

        let rooms = self.aggregator.room_count();
        if self.selected_room_index >= rooms {
            self.selected_room_index = rooms.saturating_sub(1);
        }
        ingested
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Overview | View::Trends => {
                let max = self.aggregator.room_count().saturating_sub(1);
                self.selected_room_index = (self.selected_room_index + n).min(max);
            }
            View::Alerts => {
                let max = self.aggregator.alerts().len().saturating_sub(1);
                self.selected_alert_index = (self.selected_alert_index + n).min(max);
            }
        }
    }

    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Overview | View::Trends => {
                self.selected_room_index = self.selected_room_index.saturating_sub(n);
            }
            View::Alerts => {
                self.selected_alert_index = self.selected_alert_index.saturating_sub(n);
            }
        }
    }

    pub fn select_first(&mut self) {
        match self.current_view {
            View::Overview | View::Trends => self.selected_room_index = 0,
            View::Alerts => self.selected_alert_index = 0,
        }
    }

    pub fn select_last(&mut self) {
        match self.current_view {
            View::Overview | View::Trends => {
                self.selected_room_index = self.aggregator.room_count().saturating_sub(1);
            }
            View::Alerts => {
                self.selected_alert_index = self.aggregator.alerts().len().saturating_sub(1);
            }
        }
    }

    /// Name of the highlighted room, in display order.
    pub fn selected_room(&self) -> Option<&str> {
        self.aggregator
            .rooms()
            .nth(self.selected_room_index)
            .map(|(room, _, _)| room)
    }

    /// Switch the metric that threshold keys and charts act on.
    pub fn toggle_metric(&mut self) {
        self.selected_metric = match self.selected_metric {
            Metric::Temperature => Metric::Humidity,
            Metric::Humidity => Metric::Temperature,
        };
    }

    /// Grow the chart window by `delta` readings, within the history size.
    pub fn adjust_chart_window(&mut self, delta: isize) {
        let max = self.aggregator.history_size().max(2);
        let window = self.chart_window as isize + delta;
        self.chart_window = (window.max(2) as usize).min(max);
    }

    /// Nudge the selected room's limit for the selected metric by `steps`.
    ///
    /// A room with no limit starts from its latest reading, rounded.
    pub fn adjust_threshold(&mut self, steps: i32) {
        let Some(room) = self.selected_room().map(str::to_string) else {
            self.set_status_message("No room selected".to_string());
            return;
        };
        let metric = self.selected_metric;

        let current = self
            .aggregator
            .thresholds()
            .get(&room)
            .and_then(|t| t.get(metric))
            .or_else(|| {
                self.aggregator
                    .history(&room)
                    .and_then(|h| h.latest())
                    .map(|r| r.value(metric).round())
            })
            .unwrap_or(0.0);

        let step = match metric {
            Metric::Temperature => 0.5,
            Metric::Humidity => 1.0,
        };
        let value = current + step * f64::from(steps);

        match self.aggregator.set_threshold(&room, metric, value) {
            Ok(()) => self.set_status_message(format!(
                "{} {} limit: {:.1}{}",
                room,
                metric,
                value,
                metric.unit()
            )),
            Err(e) => self.set_status_message(format!("Rejected: {}", e)),
        }
    }

    /// Apply a `Room.field=value` update typed by the operator.
    pub fn apply_threshold_update(&mut self, input: &str) {
        let result = input
            .parse::<ThresholdUpdate>()
            .and_then(|update| self.aggregator.apply_update(&update));
        match result {
            Ok(()) => self.set_status_message(format!("Applied {}", input.trim())),
            Err(e) => self.set_status_message(format!("Rejected: {}", e)),
        }
    }

    /// Enter threshold input mode, prefilled with the selected room and metric.
    pub fn start_threshold_input(&mut self) {
        self.threshold_input = match self.selected_room() {
            Some(room) => format!("{}.{}=", room, self.selected_metric.field_name()),
            None => String::new(),
        };
        self.input_active = true;
    }

    pub fn cancel_threshold_input(&mut self) {
        self.threshold_input.clear();
        self.input_active = false;
    }

    pub fn input_push(&mut self, c: char) {
        self.threshold_input.push(c);
    }

    pub fn input_pop(&mut self) {
        self.threshold_input.pop();
    }

    /// Apply the typed update and leave input mode.
    pub fn submit_threshold_input(&mut self) {
        let input = std::mem::take(&mut self.threshold_input);
        self.input_active = false;
        if !input.trim().is_empty() {
            self.apply_threshold_update(&input);
        }
    }

    pub fn dismiss_notification(&mut self) {
        self.aggregator.dismiss_notification();
    }

    /// Save thresholds to the configured store.
    pub fn save_thresholds(&mut self) {
        let Some(store) = self.store.as_deref() else {
            self.set_status_message("No threshold file configured (--thresholds)".to_string());
            return;
        };
        let message = match self.aggregator.save_thresholds(store) {
            Ok(()) => format!("Saved thresholds to {}", store.location()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to save thresholds");
                format!("Save failed: {}", e)
            }
        };
        self.set_status_message(message);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        export_aggregator(&self.aggregator, path)
    }
}

/// Write stats, rooms, alerts and thresholds as pretty JSON.
pub fn export_aggregator(aggregator: &Aggregator, path: &Path) -> Result<()> {
    use std::io::Write;

    if aggregator.room_count() == 0 {
        anyhow::bail!("No data to export");
    }

    let rooms: Vec<serde_json::Value> = aggregator
        .rooms()
        .map(|(room, history, status)| {
            serde_json::json!({
                "room": room,
                "status": format!("{:?}", status),
                "readings": history.len(),
                "latest": history.latest(),
                "temperatureDelta": history.delta(Metric::Temperature),
                "humidityDelta": history.delta(Metric::Humidity),
            })
        })
        .collect();

    let export = serde_json::json!({
        "stats": aggregator.compute_stats(),
        "rooms": rooms,
        "alerts": aggregator.alerts().as_slice(),
        "thresholds": aggregator.thresholds(),
    });

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{JsonFileStore, Thresholds};
    use crate::source::ChannelSource;
    use roomwatch_types::{BatchBuilder, DecodedBatch, Threshold};
    use tokio::sync::mpsc;

    fn app() -> (mpsc::Sender<DecodedBatch>, App) {
        let (tx, source) = ChannelSource::create("test", 128);
        let mut thresholds = Thresholds::new();
        thresholds.insert("Lobby", Threshold::new(28.0, 70.0));
        let aggregator = Aggregator::new(20).with_thresholds(thresholds);
        let app = App::new(Box::new(source), aggregator);
        (tx, app)
    }

    fn send(tx: &mpsc::Sender<DecodedBatch>, room: &str, temperature: f64) {
        let batch = BatchBuilder::new()
            .reading(room, |r| r.temperature(temperature).humidity(50.0))
            .build();
        tx.try_send(DecodedBatch::from_readings(batch)).unwrap();
    }

    #[test]
    fn view_cycles() {
        assert_eq!(View::Overview.next(), View::Trends);
        assert_eq!(View::Alerts.next(), View::Overview);
        assert_eq!(View::Overview.prev(), View::Alerts);
        assert_eq!(View::Trends.label(), "Trends");
    }

    #[test]
    fn reload_drains_source() {
        let (tx, mut app) = app();
        send(&tx, "Lobby", 31.0);
        send(&tx, "Kitchen", 22.0);

        assert_eq!(app.reload_data(), 2);
        assert_eq!(app.aggregator.room_count(), 2);
        assert_eq!(app.aggregator.alerts().len(), 1);
        assert!(app.aggregator.notification().is_some());
        assert!(app.last_update.is_some());
        assert_eq!(app.reload_data(), 0);
    }

    #[test]
    fn reload_is_bounded_per_refresh() {
        let (tx, mut app) = app();
        for _ in 0..(MAX_BATCHES_PER_REFRESH + 6) {
            send(&tx, "Lobby", 20.0);
        }
        assert_eq!(app.reload_data(), MAX_BATCHES_PER_REFRESH);
        assert_eq!(app.reload_data(), 6);
    }

    #[test]
    fn reload_surfaces_source_error() {
        let (tx, mut app) = app();
        drop(tx);
        app.reload_data();
        assert_eq!(app.load_error.as_deref(), Some("Channel closed"));
    }

    #[test]
    fn selection_follows_room_order() {
        let (tx, mut app) = app();
        send(&tx, "Office", 20.0);
        send(&tx, "Kitchen", 20.0);
        app.reload_data();

        assert_eq!(app.selected_room(), Some("Kitchen"));
        app.select_next();
        assert_eq!(app.selected_room(), Some("Office"));
        app.select_next();
        assert_eq!(app.selected_room(), Some("Office"));
        app.select_first();
        assert_eq!(app.selected_room(), Some("Kitchen"));
    }

    #[test]
    fn adjust_threshold_steps_selected_metric() {
        let (tx, mut app) = app();
        send(&tx, "Lobby", 20.0);
        app.reload_data();

        app.adjust_threshold(2);
        assert_eq!(app.aggregator.thresholds().get("Lobby").unwrap().temp, Some(29.0));

        app.toggle_metric();
        app.adjust_threshold(-1);
        assert_eq!(
            app.aggregator.thresholds().get("Lobby").unwrap().humidity,
            Some(69.0)
        );
    }

    #[test]
    fn adjust_threshold_without_limit_starts_at_latest() {
        let (tx, mut app) = app();
        send(&tx, "Kitchen", 22.4);
        app.reload_data();

        app.adjust_threshold(1);
        let kitchen = app.aggregator.thresholds().get("Kitchen").unwrap();
        assert_eq!(kitchen.temp, Some(22.5));
        assert_eq!(kitchen.humidity, None);
    }

    #[test]
    fn typed_update_rejects_bad_input() {
        let (_tx, mut app) = app();
        app.apply_threshold_update("Lobby.pressure=3");
        assert!(app.get_status_message().unwrap().starts_with("Rejected"));
        assert_eq!(app.aggregator.thresholds().get("Lobby").unwrap().temp, Some(28.0));

        app.apply_threshold_update("Lobby.temp=25");
        assert_eq!(app.aggregator.thresholds().get("Lobby").unwrap().temp, Some(25.0));
    }

    #[test]
    fn save_without_store_reports() {
        let (_tx, mut app) = app();
        app.save_thresholds();
        assert!(app.get_status_message().unwrap().contains("--thresholds"));
    }

    #[test]
    fn save_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, app) = app();
        let mut app = app.with_store(Box::new(JsonFileStore::in_dir(dir.path())));

        app.save_thresholds();
        let store = JsonFileStore::in_dir(dir.path());
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.get("Lobby"), Some(&Threshold::new(28.0, 70.0)));
    }

    #[test]
    fn export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let (tx, mut app) = app();

        assert!(app.export_state(&path).is_err());

        send(&tx, "Lobby", 31.0);
        app.reload_data();
        app.export_state(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["stats"]["activeAlerts"], 1);
        assert_eq!(value["rooms"][0]["room"], "Lobby");
        assert_eq!(value["rooms"][0]["status"], "Alerting");
        assert_eq!(value["thresholds"]["Lobby"]["temp"], 28.0);
    }
}
