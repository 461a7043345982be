//! WebSocket push endpoint.
//!
//! Every accepted connection is attached to the broadcaster and receives
//! each feed message as one text frame. Anything the client sends is
//! ignored apart from close frames.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crate::broadcaster::{Broadcaster, Subscription};
use crate::error::ServerError;

/// Pause after a failed accept, e.g. when the process is out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections forever, serving each one on its own task.
///
/// A failed accept is logged and retried; it never ends the server.
pub async fn serve(listener: TcpListener, broadcaster: Arc<Broadcaster>) {
    let incoming = futures_util::stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await;
        Some((accepted, listener))
    });
    serve_incoming(incoming, broadcaster).await;
}

/// Serve every connection yielded by `incoming` until it ends.
async fn serve_incoming<I, S>(incoming: I, broadcaster: Arc<Broadcaster>)
where
    I: Stream<Item = io::Result<(S, SocketAddr)>>,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    futures_util::pin_mut!(incoming);
    while let Some(accepted) = incoming.next().await {
        let (stream, peer) = match accepted {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let broadcaster = broadcaster.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, broadcaster).await {
                tracing::debug!(%peer, error = %e, "connection ended with error");
            }
        });
    }
}

async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    broadcaster: Arc<Broadcaster>,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut incoming) = ws.split();

    let Subscription { id, mut receiver } = broadcaster.attach(peer.to_string());
    tracing::info!(%peer, subscriber = id, "subscriber attached");

    let result = async {
        loop {
            tokio::select! {
                payload = receiver.recv() => match payload {
                    Some(payload) => sink.send(Message::text(payload.to_string())).await?,
                    None => break,
                },
                message = incoming.next() => match message {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ServerError::from(e)),
                },
            }
        }
        Ok::<(), ServerError>(())
    }
    .await;

    broadcaster.detach(id);
    tracing::info!(%peer, subscriber = id, "subscriber detached");
    result
}
