//! The live aggregator: per-room history, alert evaluation and statistics.

use std::collections::BTreeMap;

use roomwatch_types::{DecodedBatch, MalformedReading, Metric, Reading};

use super::alert::{breached_metric, evaluate, Alert, AlertHistory};
use super::history::{RoomHistory, DEFAULT_HISTORY_SIZE};
use super::stats::AggregateStats;
use super::thresholds::{ConfigError, StoreError, ThresholdStore, ThresholdUpdate, Thresholds};

/// Alert state of one room, as of its latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoomStatus {
    /// No reading seen yet.
    Unknown,
    /// Latest reading within thresholds.
    Normal,
    /// Latest reading breached a threshold.
    Alerting,
}

impl RoomStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            RoomStatus::Unknown => "--",
            RoomStatus::Normal => "OK",
            RoomStatus::Alerting => "ALERT",
        }
    }
}

/// Outcome of ingesting one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Readings appended to a room history.
    pub accepted: usize,
    /// Entries dropped, with their position in the batch.
    pub rejected: Vec<MalformedReading>,
    /// Alerts raised by this batch, in order.
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone)]
struct RoomState {
    history: RoomHistory,
    status: RoomStatus,
}

/// Client-side state for the reading feed.
///
/// Owns every piece of mutable pipeline state: room histories, thresholds,
/// the alert history and the active notification. All mutation goes through
/// `&mut self`, one batch at a time.
///
/// # Example
///
/// ```rust
/// use roomwatch::data::{Aggregator, Thresholds};
/// use roomwatch_types::{BatchBuilder, Threshold};
///
/// let mut thresholds = Thresholds::new();
/// thresholds.insert("Lobby", Threshold::new(28.0, 70.0));
/// let mut aggregator = Aggregator::new(20).with_thresholds(thresholds);
///
/// let batch = BatchBuilder::new()
///     .reading("Lobby", |r| r.temperature(31.0).humidity(50.0))
///     .build();
/// let report = aggregator.ingest(&batch);
///
/// assert_eq!(report.alerts.len(), 1);
/// assert_eq!(aggregator.compute_stats().active_alerts, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    rooms: BTreeMap<String, RoomState>,
    thresholds: Thresholds,
    alerts: AlertHistory,
    notification: Option<Alert>,
    history_size: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl Aggregator {
    /// Create an aggregator keeping `history_size` readings per room.
    pub fn new(history_size: usize) -> Self {
        Self {
            rooms: BTreeMap::new(),
            thresholds: Thresholds::new(),
            alerts: AlertHistory::new(),
            notification: None,
            history_size: history_size.max(1),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Ingest one batch of readings.
    ///
    /// Each reading is validated on its own; an invalid one is reported in
    /// `rejected` and the rest of the batch continues.
    pub fn ingest(&mut self, batch: &[Reading]) -> IngestReport {
        let mut report = IngestReport::default();
        for (index, reading) in batch.iter().enumerate() {
            match reading.validate() {
                Ok(()) => {
                    if let Some(alert) = self.ingest_reading(reading.clone()) {
                        report.alerts.push(alert);
                    }
                    report.accepted += 1;
                }
                Err(reason) => {
                    tracing::warn!(index, %reason, "dropping malformed reading");
                    report.rejected.push(MalformedReading { index, reason });
                }
            }
        }
        report
    }

    /// Ingest a decoded feed message, carrying over entries the decoder rejected.
    pub fn ingest_decoded(&mut self, batch: DecodedBatch) -> IngestReport {
        for rejected in &batch.rejected {
            tracing::warn!(%rejected, "dropping malformed feed entry");
        }
        let mut report = self.ingest(&batch.readings);
        if !batch.rejected.is_empty() {
            report.rejected.extend(batch.rejected);
            report.rejected.sort_by_key(|r| r.index);
        }
        report
    }

    fn ingest_reading(&mut self, reading: Reading) -> Option<Alert> {
        let threshold = self.thresholds.get(reading.room());
        let status = match breached_metric(&reading, threshold) {
            Some(_) => RoomStatus::Alerting,
            None => RoomStatus::Normal,
        };
        let alert = evaluate(&reading, threshold, self.alerts.last_message());

        let history_size = self.history_size;
        let state = self
            .rooms
            .entry(reading.room().to_string())
            .or_insert_with(|| RoomState {
                history: RoomHistory::new(history_size),
                status: RoomStatus::Unknown,
            });
        state.history.push(reading);
        state.status = status;

        let alert = alert?;
        tracing::info!(room = %alert.room, metric = %alert.metric, "{}", alert.message);
        self.alerts.push(alert.clone());
        self.notification = Some(alert.clone());
        Some(alert)
    }

    /// Change one limit. Affects future readings only.
    pub fn set_threshold(&mut self, room: &str, metric: Metric, value: f64) -> Result<(), ConfigError> {
        self.thresholds.set(room, metric, value)
    }

    pub fn apply_update(&mut self, update: &ThresholdUpdate) -> Result<(), ConfigError> {
        self.thresholds.apply(update)
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Replace thresholds with the stored map. Returns `false` if the store is empty.
    pub fn load_thresholds(&mut self, store: &dyn ThresholdStore) -> Result<bool, StoreError> {
        match store.load()? {
            Some(thresholds) => {
                self.thresholds = thresholds;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn save_thresholds(&self, store: &dyn ThresholdStore) -> Result<(), StoreError> {
        store.save(&self.thresholds)
    }

    pub fn compute_stats(&self) -> AggregateStats {
        AggregateStats::compute(self.rooms.values().map(|s| &s.history), self.alerts.len())
    }

    /// The most recent alert not yet dismissed.
    pub fn notification(&self) -> Option<&Alert> {
        self.notification.as_ref()
    }

    /// Clear the active notification. The alert history is untouched.
    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn alerts(&self) -> &AlertHistory {
        &self.alerts
    }

    pub fn history(&self, room: &str) -> Option<&RoomHistory> {
        self.rooms.get(room).map(|s| &s.history)
    }

    pub fn status(&self, room: &str) -> RoomStatus {
        self.rooms
            .get(room)
            .map(|s| s.status)
            .unwrap_or(RoomStatus::Unknown)
    }

    /// Known rooms in name order.
    pub fn rooms(&self) -> impl Iterator<Item = (&str, &RoomHistory, RoomStatus)> {
        self.rooms
            .iter()
            .map(|(room, s)| (room.as_str(), &s.history, s.status))
    }

    pub fn room_names(&self) -> Vec<&str> {
        self.rooms.keys().map(String::as_str).collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }
}
