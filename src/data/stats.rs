//! Aggregate statistics across rooms.

use serde::Serialize;

use super::history::RoomHistory;

/// Summary figures for the header bar and exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub room_count: usize,
    /// Mean of each room's latest temperature; 0 when no room has data.
    pub avg_temperature: f64,
    /// Mean of each room's latest humidity; 0 when no room has data.
    pub avg_humidity: f64,
    /// Length of the alert history.
    pub active_alerts: usize,
    /// Rooms whose latest reading reports a leak.
    pub leaks: usize,
}

impl AggregateStats {
    /// Derive statistics from the current histories.
    ///
    /// Rooms with an empty history count towards `room_count` but are
    /// excluded from the means.
    pub fn compute<'a, I>(histories: I, alert_count: usize) -> Self
    where
        I: IntoIterator<Item = &'a RoomHistory>,
    {
        let mut room_count = 0;
        let mut with_data = 0usize;
        let mut temperature_sum = 0.0;
        let mut humidity_sum = 0.0;
        let mut leaks = 0;

        for history in histories {
            room_count += 1;
            if let Some(latest) = history.latest() {
                with_data += 1;
                temperature_sum += latest.temperature();
                humidity_sum += latest.humidity();
                if latest.leak_detected() {
                    leaks += 1;
                }
            }
        }

        let mean = |sum: f64| {
            if with_data == 0 {
                0.0
            } else {
                sum / with_data as f64
            }
        };

        Self {
            room_count,
            avg_temperature: mean(temperature_sum),
            avg_humidity: mean(humidity_sum),
            active_alerts: alert_count,
            leaks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomwatch_types::Reading;

    fn history(room: &str, readings: &[(f64, f64, bool)]) -> RoomHistory {
        let mut h = RoomHistory::default();
        for &(t, hum, leak) in readings {
            h.push(
                Reading::builder(room)
                    .temperature(t)
                    .humidity(hum)
                    .leak(leak)
                    .build(),
            );
        }
        h
    }

    #[test]
    fn means_use_latest_reading_per_room() {
        let a = history("A", &[(10.0, 40.0, false), (30.0, 50.0, false)]);
        let b = history("B", &[(20.0, 70.0, true)]);

        let stats = AggregateStats::compute([&a, &b], 3);
        assert_eq!(stats.room_count, 2);
        assert_eq!(stats.avg_temperature, 25.0);
        assert_eq!(stats.avg_humidity, 60.0);
        assert_eq!(stats.active_alerts, 3);
        assert_eq!(stats.leaks, 1);
    }

    #[test]
    fn empty_rooms_are_excluded_from_means() {
        let a = history("A", &[(30.0, 50.0, false)]);
        let empty = RoomHistory::default();

        let stats = AggregateStats::compute([&a, &empty], 0);
        assert_eq!(stats.room_count, 2);
        assert_eq!(stats.avg_temperature, 30.0);
    }

    #[test]
    fn no_data_means_zero() {
        let stats = AggregateStats::compute(std::iter::empty(), 0);
        assert_eq!(stats, AggregateStats::default());

        let empty = RoomHistory::default();
        let stats = AggregateStats::compute([&empty], 0);
        assert_eq!(stats.avg_temperature, 0.0);
        assert_eq!(stats.avg_humidity, 0.0);
    }
}
