//! Batch - the readings produced by one generator tick.

use crate::{Reading, ReadingBuilder};

/// All readings produced in one tick, one per room.
///
/// A batch is also the unit of the push feed: one message per tick.
pub type Batch = Vec<Reading>;

/// Builder for constructing batches, mostly useful in tests and replays.
///
/// # Example
///
/// ```rust
/// use roomwatch_types::BatchBuilder;
///
/// let batch = BatchBuilder::new()
///     .reading("Lobby", |r| r.temperature(22.0).humidity(45.0))
///     .build();
/// assert_eq!(batch[0].room(), "Lobby");
/// ```
#[derive(Debug, Default)]
pub struct BatchBuilder {
    readings: Vec<Reading>,
}

impl BatchBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading built with a closure.
    pub fn reading<F>(mut self, room: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ReadingBuilder) -> ReadingBuilder,
    {
        self.readings.push(f(ReadingBuilder::new(room)).build());
        self
    }

    /// Add a pre-built reading.
    pub fn push(mut self, reading: Reading) -> Self {
        self.readings.push(reading);
        self
    }

    pub fn build(self) -> Batch {
        self.readings
    }
}
