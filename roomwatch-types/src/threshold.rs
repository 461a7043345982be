//! Per-room alert thresholds.

use crate::Metric;

/// Alert limits for one room.
///
/// A missing limit means "no limit": the metric can never raise an alert.
/// This is distinct from a limit of zero, which every positive reading
/// would exceed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    /// Temperature limit in degrees Celsius.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub temp: Option<f64>,

    /// Humidity limit in percent.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub humidity: Option<f64>,
}

impl Threshold {
    /// Create a threshold with both limits set.
    pub const fn new(temp: f64, humidity: f64) -> Self {
        Self {
            temp: Some(temp),
            humidity: Some(humidity),
        }
    }

    /// The configured limit for a metric, if any.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temp,
            Metric::Humidity => self.humidity,
        }
    }

    /// The effective limit for a metric; unset limits are infinite.
    pub fn limit(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(f64::INFINITY)
    }

    /// Set the limit for a single metric, leaving the other untouched.
    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Temperature => self.temp = Some(value),
            Metric::Humidity => self.humidity = Some(value),
        }
    }

    /// Whether `value` exceeds the limit for `metric`.
    ///
    /// The comparison is strict: a reading equal to the limit is not a breach.
    pub fn is_exceeded(&self, metric: Metric, value: f64) -> bool {
        value > self.limit(metric)
    }
}
