//! Threshold alerts and the append-only alert history.

use chrono::{DateTime, Utc};
use roomwatch_types::{Metric, Reading, Threshold};
use serde::Serialize;

/// A threshold breach, raised for one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub room: String,
    pub metric: Metric,
    /// The limit that was exceeded.
    pub limit: f64,
    pub message: String,
    /// Timestamp of the reading that raised the alert.
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(room: impl Into<String>, metric: Metric, limit: f64, timestamp: DateTime<Utc>) -> Self {
        let room = room.into();
        let message = format_message(&room, metric, limit);
        Self {
            room,
            metric,
            limit,
            message,
            timestamp,
        }
    }
}

/// Format the operator-facing message for a breach.
///
/// ```rust
/// use roomwatch::data::format_message;
/// use roomwatch_types::Metric;
///
/// assert_eq!(
///     format_message("Lobby", Metric::Temperature, 28.0),
///     "🔥 Lobby: Temperature exceeded 28°C!"
/// );
/// assert_eq!(
///     format_message("Lobby", Metric::Humidity, 70.5),
///     "💧 Lobby: Humidity exceeded 70.5%!"
/// );
/// ```
pub fn format_message(room: &str, metric: Metric, limit: f64) -> String {
    match metric {
        Metric::Temperature => format!("🔥 {}: Temperature exceeded {}°C!", room, limit),
        Metric::Humidity => format!("💧 {}: Humidity exceeded {}%!", room, limit),
    }
}

/// The metric `reading` breaches under `threshold`, if any.
///
/// Temperature is checked first; a reading over both limits reports only
/// temperature. A missing threshold never breaches.
pub fn breached_metric(reading: &Reading, threshold: Option<&Threshold>) -> Option<Metric> {
    let threshold = threshold?;
    Metric::ALL
        .into_iter()
        .find(|&metric| threshold.is_exceeded(metric, reading.value(metric)))
}

/// Decide whether `reading` raises a new alert.
///
/// Returns `None` when nothing is breached, or when the alert message equals
/// `last_message` (the most recently emitted alert, for any room).
pub fn evaluate(
    reading: &Reading,
    threshold: Option<&Threshold>,
    last_message: Option<&str>,
) -> Option<Alert> {
    let metric = breached_metric(reading, threshold)?;
    let limit = threshold?.get(metric)?;
    let alert = Alert::new(reading.room(), metric, limit, reading.timestamp());
    if last_message == Some(alert.message.as_str()) {
        return None;
    }
    Some(alert)
}

/// Ordered record of emitted alerts.
///
/// Append-only. A message identical to the last recorded one is refused.
#[derive(Debug, Clone, Default)]
pub struct AlertHistory {
    alerts: Vec<Alert>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an alert. Returns `false` if it repeats the last message.
    pub fn push(&mut self, alert: Alert) -> bool {
        if self.last_message() == Some(alert.message.as_str()) {
            return false;
        }
        self.alerts.push(alert);
        true
    }

    pub fn last(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.alerts.last().map(|a| a.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Alert> + ExactSizeIterator {
        self.alerts.iter()
    }

    pub fn as_slice(&self) -> &[Alert] {
        &self.alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(room: &str, temperature: f64, humidity: f64) -> Reading {
        Reading::builder(room)
            .temperature(temperature)
            .humidity(humidity)
            .build()
    }

    #[test]
    fn temperature_wins_over_humidity() {
        let threshold = Threshold::new(28.0, 70.0);
        let alert = evaluate(&reading("Lobby", 31.0, 90.0), Some(&threshold), None).unwrap();
        assert_eq!(alert.metric, Metric::Temperature);
        assert_eq!(alert.message, "🔥 Lobby: Temperature exceeded 28°C!");
    }

    #[test]
    fn humidity_alert_when_temperature_is_fine() {
        let threshold = Threshold::new(28.0, 70.0);
        let alert = evaluate(&reading("Lobby", 22.0, 75.5), Some(&threshold), None).unwrap();
        assert_eq!(alert.metric, Metric::Humidity);
        assert_eq!(alert.message, "💧 Lobby: Humidity exceeded 70%!");
        assert_eq!(alert.limit, 70.0);
    }

    #[test]
    fn limit_is_strict() {
        let threshold = Threshold::new(28.0, 70.0);
        assert!(evaluate(&reading("Lobby", 28.0, 70.0), Some(&threshold), None).is_none());
    }

    #[test]
    fn missing_threshold_never_alerts() {
        assert!(evaluate(&reading("Attic", 1000.0, 1000.0), None, None).is_none());
    }

    #[test]
    fn missing_field_never_alerts_on_that_metric() {
        let threshold = Threshold {
            temp: None,
            humidity: Some(70.0),
        };
        assert!(evaluate(&reading("Lobby", 99.0, 50.0), Some(&threshold), None).is_none());
        let alert = evaluate(&reading("Lobby", 99.0, 80.0), Some(&threshold), None).unwrap();
        assert_eq!(alert.metric, Metric::Humidity);
    }

    #[test]
    fn repeat_of_last_message_is_suppressed() {
        let threshold = Threshold::new(28.0, 70.0);
        let last = "🔥 Lobby: Temperature exceeded 28°C!";
        assert!(evaluate(&reading("Lobby", 31.0, 50.0), Some(&threshold), Some(last)).is_none());
        assert!(evaluate(&reading("Kitchen", 31.0, 50.0), Some(&threshold), Some(last)).is_some());
    }

    #[test]
    fn history_dedups_consecutive_only() {
        let ts = Utc::now();
        let a = Alert::new("Lobby", Metric::Temperature, 28.0, ts);
        let b = Alert::new("Lobby", Metric::Humidity, 70.0, ts);

        let mut history = AlertHistory::new();
        assert!(history.push(a.clone()));
        assert!(!history.push(a.clone()));
        assert!(history.push(b));
        assert!(history.push(a));

        assert_eq!(history.len(), 3);
    }

    #[test]
    fn fractional_limits_keep_their_decimals() {
        assert_eq!(
            format_message("Office", Metric::Temperature, 28.5),
            "🔥 Office: Temperature exceeded 28.5°C!"
        );
    }
}
