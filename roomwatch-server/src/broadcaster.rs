//! Subscriber registry and fan-out delivery.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use roomwatch_types::{encode_batch, Batch};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Identifier assigned to a subscriber on attach.
pub type SubscriberId = u64;

/// A serialized feed message, shared by every subscriber of one broadcast.
pub type Payload = Arc<str>;

/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

#[derive(Debug)]
struct Subscriber {
    peer: String,
    tx: mpsc::Sender<Payload>,
}

/// The receiving side of an attached subscriber.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Payload>,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers that accepted the message.
    pub delivered: usize,
    /// Subscribers whose queue was full; they miss this message.
    pub dropped: usize,
    /// Subscribers found closed during delivery and removed.
    pub detached: usize,
}

/// Fans each batch out to every attached subscriber.
///
/// Delivery is best-effort and never blocks: a slow subscriber loses
/// messages rather than holding up the others. The registry is snapshotted
/// before delivery, so attach and detach may run concurrently with a
/// broadcast.
#[derive(Debug)]
pub struct Broadcaster {
    subscribers: RwLock<BTreeMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Broadcaster {
    /// Create a broadcaster whose subscribers each queue up to `buffer` messages.
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber.
    pub fn attach(&self, peer: impl Into<String>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::channel(self.buffer);
        self.subscribers.write().insert(
            id,
            Subscriber {
                peer: peer.into(),
                tx,
            },
        );
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns `false` if it was not attached.
    pub fn detach(&self, id: SubscriberId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Serialize `batch` once and deliver it to every subscriber.
    pub fn broadcast(&self, batch: &Batch) -> serde_json::Result<DeliveryReport> {
        let payload: Payload = encode_batch(batch)?.into();
        Ok(self.deliver(payload))
    }

    /// Deliver an already-serialized message to every subscriber.
    pub fn deliver(&self, payload: Payload) -> DeliveryReport {
        let targets: Vec<(SubscriberId, String, mpsc::Sender<Payload>)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, s)| (*id, s.peer.clone(), s.tx.clone()))
            .collect();

        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();

        for (id, peer, tx) in targets {
            match tx.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = id, %peer, "subscriber queue full, dropping message");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push((id, peer)),
            }
        }

        for (id, peer) in closed {
            if self.detach(id) {
                tracing::debug!(subscriber = id, %peer, "detached closed subscriber");
                report.detached += 1;
            }
        }

        report
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomwatch_types::{decode_batch, BatchBuilder};

    fn batch(temperature: f64) -> Batch {
        BatchBuilder::new()
            .reading("Lobby", |r| r.temperature(temperature).humidity(50.0))
            .build()
    }

    #[test]
    fn every_subscriber_receives_the_same_payload() {
        let broadcaster = Broadcaster::default();
        let mut a = broadcaster.attach("a");
        let mut b = broadcaster.attach("b");

        let report = broadcaster.broadcast(&batch(22.0)).unwrap();
        assert_eq!(report.delivered, 2);

        let pa = a.receiver.try_recv().unwrap();
        let pb = b.receiver.try_recv().unwrap();
        assert!(Arc::ptr_eq(&pa, &pb));

        let decoded = decode_batch(pa.as_bytes()).unwrap();
        assert_eq!(decoded.readings[0].temperature(), 22.0);
    }

    #[test]
    fn no_subscribers_is_not_an_error() {
        let broadcaster = Broadcaster::default();
        let report = broadcaster.broadcast(&batch(22.0)).unwrap();
        assert_eq!(report, DeliveryReport::default());
    }

    #[test]
    fn detached_subscriber_receives_nothing() {
        let broadcaster = Broadcaster::default();
        let mut a = broadcaster.attach("a");
        assert!(broadcaster.detach(a.id));
        assert!(!broadcaster.detach(a.id));

        let report = broadcaster.broadcast(&batch(22.0)).unwrap();
        assert_eq!(report.delivered, 0);
        assert!(a.receiver.try_recv().is_err());
    }

    #[test]
    fn closed_subscriber_is_detached_and_others_still_receive() {
        let broadcaster = Broadcaster::default();
        let gone = broadcaster.attach("gone");
        let mut stays = broadcaster.attach("stays");
        drop(gone.receiver);

        let report = broadcaster.broadcast(&batch(22.0)).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.detached, 1);
        assert_eq!(broadcaster.subscriber_count(), 1);
        assert!(stays.receiver.try_recv().is_ok());
    }

    #[test]
    fn full_subscriber_drops_without_blocking_others() {
        let broadcaster = Broadcaster::new(1);
        let _slow = broadcaster.attach("slow");
        let mut fast = broadcaster.attach("fast");

        let first = broadcaster.broadcast(&batch(20.0)).unwrap();
        assert_eq!(first.delivered, 2);
        fast.receiver.try_recv().unwrap();

        let second = broadcaster.broadcast(&batch(21.0)).unwrap();
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, 1);
        assert_eq!(broadcaster.subscriber_count(), 2);
    }

    #[test]
    fn subscribers_receive_ticks_in_order() {
        let broadcaster = Broadcaster::new(8);
        let mut sub = broadcaster.attach("a");
        for t in [20.0, 21.0, 22.0] {
            broadcaster.broadcast(&batch(t)).unwrap();
        }
        let received: Vec<f64> = (0..3)
            .map(|_| {
                let payload = sub.receiver.try_recv().unwrap();
                decode_batch(payload.as_bytes()).unwrap().readings[0].temperature()
            })
            .collect();
        assert_eq!(received, vec![20.0, 21.0, 22.0]);
    }

    #[test]
    fn detach_during_broadcast_does_not_disturb_remaining_subscribers() {
        let broadcaster = Arc::new(Broadcaster::new(1024));
        let mut steady = broadcaster.attach("steady");
        let churn: Vec<Subscription> = (0..32)
            .map(|i| broadcaster.attach(format!("churn-{}", i)))
            .collect();
        let ids: Vec<SubscriberId> = churn.iter().map(|s| s.id).collect();

        let detacher = {
            let broadcaster = broadcaster.clone();
            std::thread::spawn(move || {
                for id in ids {
                    broadcaster.detach(id);
                    std::thread::yield_now();
                }
            })
        };

        for i in 0..200 {
            broadcaster.broadcast(&batch(i as f64)).unwrap();
        }
        detacher.join().unwrap();
        drop(churn);

        assert_eq!(broadcaster.subscriber_count(), 1);
        for i in 0..200 {
            let payload = steady.receiver.try_recv().unwrap();
            let decoded = decode_batch(payload.as_bytes()).unwrap();
            assert_eq!(decoded.readings[0].temperature(), i as f64);
        }
    }
}
