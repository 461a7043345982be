//! Reading source abstraction for receiving feed batches.
//!
//! A source hands decoded batches to the dashboard without blocking. The
//! implementations cover the live WebSocket feed, arbitrary byte streams,
//! in-process channels, recorded feed logs and an offline simulator.

mod channel;
mod replay;
mod simulated;
mod stream;
mod websocket;

pub use channel::ChannelSource;
pub use replay::ReplaySource;
pub use simulated::{SimulatedSource, MAX_BACKFILL};
pub use stream::StreamSource;
pub use websocket::WebSocketSource;

use std::fmt::Debug;

use roomwatch_types::DecodedBatch;

/// Trait for receiving reading batches from various sources.
///
/// # Example
///
/// ```
/// use roomwatch::{ChannelSource, ReadingSource};
/// use roomwatch_types::{BatchBuilder, DecodedBatch};
///
/// let (tx, mut source) = ChannelSource::create("example", 4);
/// let batch = BatchBuilder::new()
///     .reading("Lobby", |r| r.temperature(21.0).humidity(45.0))
///     .build();
/// tx.try_send(DecodedBatch::from_readings(batch)).unwrap();
///
/// let received = source.poll().unwrap();
/// assert_eq!(received.readings.len(), 1);
/// ```
pub trait ReadingSource: Send + Debug {
    /// Poll for the next batch.
    ///
    /// Returns `Some(batch)` if one is available, `None` otherwise.
    /// This method must not block.
    fn poll(&mut self) -> Option<DecodedBatch>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The most recent error, if the source is currently unhealthy.
    fn error(&self) -> Option<String>;
}
