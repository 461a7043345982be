//! Offline simulator source.
//!
//! Drives a [`Generator`] in-process so the dashboard stays usable without a
//! feed server.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Utc;
use roomwatch_server::{Generator, RandomWalkSampler, Sampler};
use roomwatch_types::DecodedBatch;

use super::ReadingSource;

/// Rooms simulated when none are given.
pub const DEFAULT_ROOMS: [&str; 4] = ["Living Room", "Kitchen", "Bedroom", "Office"];

/// Default pacing between simulated batches.
pub const DEFAULT_TICK: Duration = Duration::from_secs(3);

/// Most batches a single back-fill will queue.
pub const MAX_BACKFILL: usize = 10_000;

/// Spacing between back-filled batches.
const BACKFILL_SPACING: chrono::Duration = chrono::Duration::seconds(60);

/// A source producing random-walk readings on a fixed cadence.
///
/// `poll` never blocks: it returns a batch only once the tick interval has
/// elapsed since the previous one. Back-filled batches are returned first,
/// one per poll, without waiting.
#[derive(Debug)]
pub struct SimulatedSource {
    generator: Generator,
    tick: Duration,
    next_due: Option<Instant>,
    pending: VecDeque<DecodedBatch>,
    description: String,
}

impl SimulatedSource {
    /// Simulate [`DEFAULT_ROOMS`] with a random walk every [`DEFAULT_TICK`].
    pub fn new() -> Self {
        Self::with_sampler(DEFAULT_ROOMS, Box::new(RandomWalkSampler::new()))
    }

    pub fn with_sampler<I, S>(rooms: I, sampler: Box<dyn Sampler>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Generator::new(rooms, sampler);
        let description = format!("simulated: {} rooms", generator.rooms().len());
        Self {
            generator,
            tick: DEFAULT_TICK,
            next_due: None,
            pending: VecDeque::new(),
            description,
        }
    }

    /// Set the pacing between live batches.
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Queue `count` batches stamped one minute apart, ending now.
    ///
    /// `count` is capped at [`MAX_BACKFILL`].
    pub fn backfill(mut self, count: usize) -> Self {
        let now = Utc::now();
        let count = i32::try_from(count.min(MAX_BACKFILL)).unwrap_or_default();
        for i in (1..=count).rev() {
            let at = now - BACKFILL_SPACING * i;
            let batch = self.generator.tick_at(at);
            self.pending.push_back(DecodedBatch::from_readings(batch));
        }
        self
    }

    pub fn rooms(&self) -> &[String] {
        self.generator.rooms()
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for SimulatedSource {
    fn poll(&mut self) -> Option<DecodedBatch> {
        if let Some(batch) = self.pending.pop_front() {
            return Some(batch);
        }

        let now = Instant::now();
        if let Some(due) = self.next_due {
            if now < due {
                return None;
            }
        }
        self.next_due = Some(now + self.tick);
        Some(DecodedBatch::from_readings(self.generator.tick()))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomwatch_server::{ConstantSampler, Sample};

    fn constant() -> Box<dyn Sampler> {
        Box::new(ConstantSampler(Sample {
            temperature: 22.0,
            humidity: 55.0,
            leak_detected: false,
        }))
    }

    #[test]
    fn default_rooms() {
        let source = SimulatedSource::new();
        assert_eq!(source.rooms(), DEFAULT_ROOMS);
        assert_eq!(source.description(), "simulated: 4 rooms");
        assert!(source.error().is_none());
    }

    #[test]
    fn first_poll_is_immediate_then_paced() {
        let mut source = SimulatedSource::with_sampler(["Lobby"], constant())
            .tick(Duration::from_secs(3600));

        let batch = source.poll().unwrap();
        assert_eq!(batch.readings.len(), 1);
        assert_eq!(batch.readings[0].temperature(), 22.0);
        assert!(source.poll().is_none());
    }

    #[test]
    fn zero_tick_yields_every_poll() {
        let mut source = SimulatedSource::with_sampler(["A", "B"], constant()).tick(Duration::ZERO);
        assert!(source.poll().is_some());
        assert!(source.poll().is_some());
    }

    #[test]
    fn backfill_is_drained_first_in_time_order() {
        let mut source = SimulatedSource::with_sampler(["Lobby"], constant())
            .tick(Duration::from_secs(3600))
            .backfill(10);

        let mut stamps = Vec::new();
        while let Some(batch) = source.poll() {
            stamps.push(batch.readings[0].timestamp());
        }

        // ten back-filled plus the first live batch
        assert_eq!(stamps.len(), 11);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(stamps[1] - stamps[0], BACKFILL_SPACING);
    }

    #[test]
    fn oversized_backfill_is_capped() {
        let mut source = SimulatedSource::with_sampler(["Lobby"], constant())
            .tick(Duration::from_secs(3600))
            .backfill(usize::MAX);

        let mut stamps = Vec::new();
        while let Some(batch) = source.poll() {
            stamps.push(batch.readings[0].timestamp());
        }

        assert_eq!(stamps.len(), MAX_BACKFILL + 1);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
