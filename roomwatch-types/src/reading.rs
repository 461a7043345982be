//! Reading - one sensor sample for one room.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::MalformedReason;

/// A single timestamped sensor sample for one room.
///
/// Readings are immutable once created: the fields are only reachable
/// through accessors, and the pipeline moves or clones them but never
/// edits them in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Reading {
    room: String,
    temperature: f64,
    humidity: f64,
    leak_detected: bool,
    timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a reading from its parts.
    pub fn new(
        room: impl Into<String>,
        temperature: f64,
        humidity: f64,
        leak_detected: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            room: room.into(),
            temperature,
            humidity,
            leak_detected,
            timestamp,
        }
    }

    /// Create a builder for a reading in the given room.
    ///
    /// Unset values default to zero, no leak, and the current instant.
    pub fn builder(room: impl Into<String>) -> ReadingBuilder {
        ReadingBuilder::new(room)
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn leak_detected(&self) -> bool {
        self.leak_detected
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The value of the given metric.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
        }
    }

    /// Check the shape constraints a reading must satisfy to be ingested.
    ///
    /// The room must be non-empty and both measurements must be finite.
    /// Practical ranges are not enforced.
    pub fn validate(&self) -> Result<(), MalformedReason> {
        if self.room.trim().is_empty() {
            return Err(MalformedReason::EmptyRoom);
        }
        if !self.temperature.is_finite() {
            return Err(MalformedReason::NotFinite("temperature"));
        }
        if !self.humidity.is_finite() {
            return Err(MalformedReason::NotFinite("humidity"));
        }
        Ok(())
    }
}

/// Builder for [`Reading`] values.
#[derive(Debug, Clone)]
pub struct ReadingBuilder {
    room: String,
    temperature: f64,
    humidity: f64,
    leak_detected: bool,
    timestamp: Option<DateTime<Utc>>,
}

impl ReadingBuilder {
    /// Create a new builder for the given room.
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            temperature: 0.0,
            humidity: 0.0,
            leak_detected: false,
            timestamp: None,
        }
    }

    pub fn temperature(mut self, value: f64) -> Self {
        self.temperature = value;
        self
    }

    pub fn humidity(mut self, value: f64) -> Self {
        self.humidity = value;
        self
    }

    pub fn leak(mut self, detected: bool) -> Self {
        self.leak_detected = detected;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the reading.
    pub fn build(self) -> Reading {
        Reading {
            room: self.room,
            temperature: self.temperature,
            humidity: self.humidity,
            leak_detected: self.leak_detected,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

/// A thresholded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Metric {
    Temperature,
    Humidity,
}

impl Metric {
    /// All metrics, in evaluation priority order.
    pub const ALL: [Metric; 2] = [Metric::Temperature, Metric::Humidity];

    /// The field name used in threshold configuration (`temp` / `humidity`).
    pub fn field_name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temp",
            Metric::Humidity => "humidity",
        }
    }

    /// Display unit for values of this metric.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Temperature => write!(f, "temperature"),
            Metric::Humidity => write!(f, "humidity"),
        }
    }
}

/// Error returned when a metric name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}` (expected `temp` or `humidity`)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temp" | "temperature" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}
