//! Bounded per-room reading history.

use std::collections::VecDeque;

use roomwatch_types::{Metric, Reading};

/// Default number of readings kept per room.
pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// The most recent readings for one room, oldest first.
///
/// Holds at most `capacity` readings; pushing beyond that evicts the oldest.
#[derive(Debug, Clone)]
pub struct RoomHistory {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl Default for RoomHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl RoomHistory {
    /// Create an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All readings, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Reading> + ExactSizeIterator {
        self.readings.iter()
    }

    /// The last `window` readings, oldest first.
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &Reading> {
        self.readings
            .iter()
            .skip(self.readings.len().saturating_sub(window))
    }

    /// Values of one metric over the last `window` readings, oldest first.
    pub fn values(&self, metric: Metric, window: usize) -> Vec<f64> {
        self.recent(window).map(|r| r.value(metric)).collect()
    }

    /// Sparkline data for one metric (normalized to 0-7 for 8 bar levels).
    ///
    /// Returns an empty Vec if there are fewer than two readings. A flat
    /// series maps to the middle level.
    pub fn sparkline(&self, metric: Metric, window: usize) -> Vec<u8> {
        let values = self.values(metric, window);
        if values.len() < 2 {
            return Vec::new();
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        if range <= f64::EPSILON {
            return vec![3; values.len()];
        }

        values
            .iter()
            .map(|&v| (((v - min) / range * 7.0).round() as u8).min(7))
            .collect()
    }

    /// Change in one metric between the last two readings.
    pub fn delta(&self, metric: Metric) -> Option<f64> {
        let mut recent = self.readings.iter().rev();
        let latest = recent.next()?;
        let previous = recent.next()?;
        Some(latest.value(metric) - previous.value(metric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f64) -> Reading {
        Reading::builder("Lobby")
            .temperature(temperature)
            .humidity(50.0)
            .build()
    }

    #[test]
    fn new_history_is_empty() {
        let h = RoomHistory::default();
        assert!(h.is_empty());
        assert!(h.latest().is_none());
        assert_eq!(h.capacity(), DEFAULT_HISTORY_SIZE);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut h = RoomHistory::new(0);
        h.push(reading(20.0));
        h.push(reading(21.0));
        assert_eq!(h.len(), 1);
        assert_eq!(h.latest().unwrap().temperature(), 21.0);
    }

    #[test]
    fn history_keeps_last_n_in_arrival_order() {
        let mut h = RoomHistory::new(5);
        for i in 0..12 {
            h.push(reading(i as f64));
            assert!(h.len() <= 5);
        }

        let temps: Vec<f64> = h.iter().map(|r| r.temperature()).collect();
        assert_eq!(temps, vec![7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn recent_takes_the_tail() {
        let mut h = RoomHistory::new(20);
        for i in 0..15 {
            h.push(reading(i as f64));
        }
        assert_eq!(
            h.values(Metric::Temperature, 3),
            vec![12.0, 13.0, 14.0]
        );
        assert_eq!(h.values(Metric::Temperature, 100).len(), 15);
    }

    #[test]
    fn sparkline_empty_with_single_reading() {
        let mut h = RoomHistory::default();
        h.push(reading(20.0));
        assert!(h.sparkline(Metric::Temperature, 10).is_empty());
    }

    #[test]
    fn sparkline_spans_full_range() {
        let mut h = RoomHistory::default();
        for t in [20.0, 22.0, 24.0, 26.0] {
            h.push(reading(t));
        }
        let sparkline = h.sparkline(Metric::Temperature, 10);
        assert_eq!(sparkline.first(), Some(&0));
        assert_eq!(sparkline.last(), Some(&7));
        assert!(sparkline.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn flat_sparkline_is_mid_level() {
        let mut h = RoomHistory::default();
        for _ in 0..4 {
            h.push(reading(22.0));
        }
        assert_eq!(h.sparkline(Metric::Temperature, 10), vec![3, 3, 3, 3]);
    }

    #[test]
    fn delta_between_last_two() {
        let mut h = RoomHistory::default();
        assert!(h.delta(Metric::Temperature).is_none());
        h.push(reading(20.0));
        assert!(h.delta(Metric::Temperature).is_none());
        h.push(reading(22.5));
        assert_eq!(h.delta(Metric::Temperature), Some(2.5));
    }
}
