//! Tick-driven reading generator.

use chrono::{DateTime, Utc};
use roomwatch_types::{Batch, Reading};

use crate::sampler::Sampler;

/// Produces one batch per tick, with one reading per registered room.
///
/// The room registry is fixed at construction. Empty and duplicate names
/// are dropped, keeping the first occurrence. Timestamps never go backwards
/// between ticks, even if the wall clock does.
#[derive(Debug)]
pub struct Generator {
    rooms: Vec<String>,
    sampler: Box<dyn Sampler>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Generator {
    pub fn new<I, S>(rooms: I, sampler: Box<dyn Sampler>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry: Vec<String> = Vec::new();
        for room in rooms {
            let room = room.into().trim().to_string();
            if !room.is_empty() && !registry.contains(&room) {
                registry.push(room);
            }
        }

        Self {
            rooms: registry,
            sampler,
            last_timestamp: None,
        }
    }

    /// The room registry, in emission order.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Produce the next batch stamped with the current time.
    pub fn tick(&mut self) -> Batch {
        self.tick_at(Utc::now())
    }

    /// Produce the next batch stamped with `now`.
    ///
    /// All readings of one batch share a timestamp. If `now` is earlier than
    /// the previous tick, the previous timestamp is reused.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Batch {
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let sampler = &mut self.sampler;
        self.rooms
            .iter()
            .map(|room| {
                let sample = sampler.sample(room);
                Reading::new(
                    room.as_str(),
                    sample.temperature,
                    sample.humidity,
                    sample.leak_detected,
                    timestamp,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{ConstantSampler, Sample, UniformSampler};
    use chrono::Duration;

    fn constant() -> Box<dyn Sampler> {
        Box::new(ConstantSampler(Sample {
            temperature: 31.0,
            humidity: 50.0,
            leak_detected: false,
        }))
    }

    #[test]
    fn one_reading_per_room_in_registry_order() {
        let mut generator = Generator::new(["Lobby", "Kitchen", "Storage"], constant());
        let batch = generator.tick();

        let rooms: Vec<&str> = batch.iter().map(|r| r.room()).collect();
        assert_eq!(rooms, vec!["Lobby", "Kitchen", "Storage"]);
        assert!(batch.iter().all(|r| r.validate().is_ok()));
    }

    #[test]
    fn registry_drops_empty_and_duplicate_rooms() {
        let generator = Generator::new(["Lobby", "", "  ", "Lobby", "Kitchen"], constant());
        assert_eq!(generator.rooms(), &["Lobby".to_string(), "Kitchen".to_string()]);
    }

    #[test]
    fn readings_in_a_batch_share_a_timestamp() {
        let mut generator =
            Generator::new(["Lobby", "Kitchen"], Box::new(UniformSampler::seeded(9)));
        let batch = generator.tick();
        assert_eq!(batch[0].timestamp(), batch[1].timestamp());
    }

    #[test]
    fn timestamps_do_not_go_backwards() {
        let mut generator = Generator::new(["Lobby"], constant());
        let now = Utc::now();

        let first = generator.tick_at(now);
        let second = generator.tick_at(now - Duration::seconds(30));
        let third = generator.tick_at(now + Duration::seconds(2));

        assert_eq!(second[0].timestamp(), first[0].timestamp());
        assert!(third[0].timestamp() > second[0].timestamp());
    }

    #[test]
    fn empty_registry_produces_empty_batches() {
        let mut generator = Generator::new(Vec::<String>::new(), constant());
        assert!(generator.tick().is_empty());
    }
}
