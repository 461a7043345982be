//! Stream-based reading source.
//!
//! Receives feed messages from an async byte stream, one JSON array per
//! line, or from a channel of raw message bytes.

use std::sync::Arc;

use parking_lot::Mutex;
use roomwatch_types::{decode_batch, DecodedBatch};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::ReadingSource;

/// A source that decodes feed messages on a background task.
///
/// A message that fails to decode is skipped and recorded as the current
/// error; the stream keeps going.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use roomwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"[]\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<DecodedBatch>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a task reading newline-delimited feed messages from `reader`.
    ///
    /// Blank lines are ignored.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        *error_handle.lock() = Some("Stream ended".to_string());
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if !forward(trimmed.as_bytes(), &tx, &error_handle).await {
                            break;
                        }
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }

    /// Decode raw feed messages pushed through a bytes channel.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, batch_rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if !forward(&bytes, &tx, &error_handle).await {
                    break;
                }
            }
        });

        Self {
            receiver: batch_rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }
}

/// Decode one message and pass it on. Returns `false` once the receiver is gone.
pub(crate) async fn forward(
    bytes: &[u8],
    tx: &mpsc::Sender<DecodedBatch>,
    error: &Mutex<Option<String>>,
) -> bool {
    match decode_batch(bytes) {
        Ok(batch) => {
            *error.lock() = None;
            tx.send(batch).await.is_ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable feed message");
            *error.lock() = Some(format!("Decode error: {}", e));
            true
        }
    }
}

impl ReadingSource for StreamSource {
    fn poll(&mut self) -> Option<DecodedBatch> {
        match self.receiver.try_recv() {
            Ok(batch) => Some(batch),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut error = self.last_error.lock();
                if error.is_none() {
                    *error = Some("Stream disconnected".to_string());
                }
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_json(room: &str) -> String {
        format!(
            r#"[{{"room":"{}","temperature":"23.4","humidity":51.0,"leakDetected":false,"timestamp":"2024-05-01T10:00:00Z"}}]"#,
            room
        )
    }

    #[tokio::test]
    async fn stream_source_spawn() {
        let data = format!("{}\n", sample_json("Lobby"));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let batch = source.poll().unwrap();
        assert_eq!(batch.readings[0].room(), "Lobby");
        assert_eq!(batch.readings[0].temperature(), 23.4);
    }

    #[tokio::test]
    async fn stream_source_multiple_batches_and_blank_lines() {
        let data = format!("{}\n\n{}\n", sample_json("Lobby"), sample_json("Kitchen"));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert_eq!(source.poll().unwrap().readings[0].room(), "Lobby");
        assert_eq!(source.poll().unwrap().readings[0].room(), "Kitchen");
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn stream_source_description() {
        let source = StreamSource::spawn(Cursor::new(""), "tcp://localhost:4000");
        assert_eq!(source.description(), "stream: tcp://localhost:4000");
    }

    #[tokio::test]
    async fn stream_source_skips_bad_messages() {
        let data = format!("not json\n{{\"room\":\"Lobby\"}}\n{}\n", sample_json("Lobby"));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let batch = source.poll().unwrap();
        assert_eq!(batch.readings[0].room(), "Lobby");
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn stream_source_from_bytes_channel() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
        let mut source = StreamSource::from_bytes_channel(rx, "test-channel");

        tx.send(b"oops".to_vec()).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().starts_with("Decode error"));

        tx.send(sample_json("Storage").into_bytes()).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let batch = source.poll().unwrap();
        assert_eq!(batch.readings[0].room(), "Storage");
        assert!(source.error().is_none());
    }

    #[tokio::test]
    async fn stream_source_reports_end_of_stream() {
        let mut source = StreamSource::spawn(Cursor::new(""), "test");
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Stream ended"));
    }
}
