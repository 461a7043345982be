//! Live WebSocket feed source.
//!
//! Connects to a feed server, decodes every text frame as one batch and
//! reconnects after a delay whenever the connection drops.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use roomwatch_types::DecodedBatch;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::stream::forward;
use super::ReadingSource;

/// Default wait between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// A source connected to a `roomwatch-server` (or any compatible feed).
///
/// Must be created inside a tokio runtime. The background task stops once
/// the source is dropped.
#[derive(Debug)]
pub struct WebSocketSource {
    receiver: mpsc::Receiver<DecodedBatch>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl WebSocketSource {
    pub fn connect(url: &str) -> Self {
        Self::connect_with_delay(url, DEFAULT_RECONNECT_DELAY)
    }

    pub fn connect_with_delay(url: &str, reconnect_delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(Some("Connecting...".to_string())));
        let error_handle = last_error.clone();
        let target = url.to_string();

        tokio::spawn(async move {
            loop {
                let reason = match connect_async(target.as_str()).await {
                    Ok((ws, _)) => {
                        tracing::info!(url = %target, "connected to feed");
                        *error_handle.lock() = None;
                        match read_frames(ws, &tx, &error_handle).await {
                            Some(reason) => reason,
                            None => break,
                        }
                    }
                    Err(e) => format!("Connect failed: {}", e),
                };

                if tx.is_closed() {
                    break;
                }
                tracing::warn!(url = %target, %reason, "feed unavailable, retrying");
                *error_handle.lock() = Some(format!(
                    "{} (retrying in {}s)",
                    reason,
                    reconnect_delay.as_secs_f64()
                ));
                tokio::time::sleep(reconnect_delay).await;
            }
        });

        Self {
            receiver: rx,
            description: format!("ws: {}", url),
            last_error,
        }
    }
}

/// Forward frames until the connection ends.
///
/// Returns the disconnect reason, or `None` if the source was dropped.
async fn read_frames<S>(
    mut ws: S,
    tx: &mpsc::Sender<DecodedBatch>,
    error: &Mutex<Option<String>>,
) -> Option<String>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if !forward(text.as_bytes(), tx, error).await {
                    return None;
                }
            }
            Ok(Message::Binary(bytes)) => {
                if !forward(&bytes, tx, error).await {
                    return None;
                }
            }
            Ok(Message::Close(_)) => return Some("Connection closed by server".to_string()),
            Ok(_) => {}
            Err(e) => return Some(format!("Connection lost: {}", e)),
        }
    }
    Some("Connection closed".to_string())
}

impl ReadingSource for WebSocketSource {
    fn poll(&mut self) -> Option<DecodedBatch> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
