//! Channel-based reading source.
//!
//! Receives already-decoded batches through a tokio mpsc channel. Useful
//! when the producer lives in the same process, such as an embedded
//! [`FeedService`](roomwatch_server::FeedService) or a test.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::ReadingSource;
use roomwatch_types::DecodedBatch;

/// A source fed by an in-process channel.
///
/// Every batch sent is delivered exactly once, in order.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<DecodedBatch>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<DecodedBatch>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a channel pair holding up to `buffer` undelivered batches.
    pub fn create(source_description: &str, buffer: usize) -> (mpsc::Sender<DecodedBatch>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx, source_description))
    }
}

impl ReadingSource for ChannelSource {
    fn poll(&mut self) -> Option<DecodedBatch> {
        match self.receiver.try_recv() {
            Ok(batch) => Some(batch),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.closed.then(|| "Channel closed".to_string())
    }
}
