//! The feed service: a generator driven by a timer, feeding a broadcaster.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use roomwatch_types::Batch;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::broadcaster::{Broadcaster, DeliveryReport, DEFAULT_SUBSCRIBER_BUFFER};
use crate::config::ServerConfig;
use crate::generator::Generator;
use crate::sampler::{Sampler, UniformSampler};

/// Generates a batch every interval and broadcasts it to all subscribers.
///
/// # Example
///
/// ```rust,no_run
/// use roomwatch_server::{FeedService, UniformSampler};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let service = FeedService::builder()
///         .rooms(["Lobby", "Kitchen"])
///         .sampler(UniformSampler::seeded(1))
///         .interval(Duration::from_millis(500))
///         .build();
///
///     let mut subscription = service.broadcaster().attach("local");
///     let ticks = service.start();
///
///     if let Some(message) = subscription.receiver.recv().await {
///         println!("{}", message);
///     }
///     ticks.stop();
/// }
/// ```
#[derive(Debug)]
pub struct FeedService {
    generator: Arc<Mutex<Generator>>,
    broadcaster: Arc<Broadcaster>,
    interval: Duration,
}

impl FeedService {
    pub fn builder() -> FeedServiceBuilder {
        FeedServiceBuilder::new()
    }

    /// Build a service from loaded configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::builder()
            .rooms(config.rooms.iter().cloned())
            .boxed_sampler(config.sampler.build(config.seed, config.leak_probability))
            .interval(config.interval())
            .subscriber_buffer(config.subscriber_buffer)
            .build()
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        self.broadcaster.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Generate one batch and broadcast it immediately.
    pub fn tick_now(&self) -> (Batch, DeliveryReport) {
        tick(&self.generator, &self.broadcaster)
    }

    /// Start ticking in the background.
    ///
    /// The first batch is emitted immediately, then one per interval. Returns
    /// a handle that stops the timer when stopped or dropped.
    pub fn start(&self) -> TickHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let generator = self.generator.clone();
        let broadcaster = self.broadcaster.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        tick(&generator, &broadcaster);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("feed ticker stopped");
        });

        TickHandle { stop_tx }
    }
}

fn tick(generator: &Mutex<Generator>, broadcaster: &Broadcaster) -> (Batch, DeliveryReport) {
    let batch = generator.lock().tick();
    let report = match broadcaster.broadcast(&batch) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize batch");
            DeliveryReport::default()
        }
    };
    tracing::debug!(
        readings = batch.len(),
        delivered = report.delivered,
        dropped = report.dropped,
        detached = report.detached,
        "tick"
    );
    (batch, report)
}

/// Builder for [`FeedService`].
#[derive(Debug, Default)]
pub struct FeedServiceBuilder {
    rooms: Vec<String>,
    sampler: Option<Box<dyn Sampler>>,
    interval: Option<Duration>,
    subscriber_buffer: Option<usize>,
}

impl FeedServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the room registry.
    pub fn rooms<I, S>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms = rooms.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sampler. Defaults to an entropy-seeded [`UniformSampler`].
    pub fn sampler(self, sampler: impl Sampler + 'static) -> Self {
        self.boxed_sampler(Box::new(sampler))
    }

    pub fn boxed_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Set the tick interval. Defaults to 2 seconds.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = Some(buffer);
        self
    }

    pub fn build(self) -> FeedService {
        let sampler = self
            .sampler
            .unwrap_or_else(|| Box::new(UniformSampler::new()));
        FeedService {
            generator: Arc::new(Mutex::new(Generator::new(self.rooms, sampler))),
            broadcaster: Arc::new(Broadcaster::new(
                self.subscriber_buffer.unwrap_or(DEFAULT_SUBSCRIBER_BUFFER),
            )),
            interval: self.interval.unwrap_or(Duration::from_secs(2)),
        }
    }
}

/// Handle for controlling background ticking.
///
/// Drop this handle to stop ticking, or call `stop()` explicitly.
#[derive(Debug)]
pub struct TickHandle {
    stop_tx: watch::Sender<bool>,
}

impl TickHandle {
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{ConstantSampler, Sample};
    use roomwatch_types::decode_batch;

    fn service(interval: Duration) -> FeedService {
        FeedService::builder()
            .rooms(["Lobby", "Kitchen"])
            .sampler(ConstantSampler(Sample {
                temperature: 31.0,
                humidity: 50.0,
                leak_detected: false,
            }))
            .interval(interval)
            .build()
    }

    #[test]
    fn tick_now_broadcasts_one_batch() {
        let service = service(Duration::from_secs(1));
        let mut sub = service.broadcaster().attach("test");

        let (batch, report) = service.tick_now();
        assert_eq!(batch.len(), 2);
        assert_eq!(report.delivered, 1);

        let payload = sub.receiver.try_recv().unwrap();
        let decoded = decode_batch(payload.as_bytes()).unwrap();
        assert_eq!(decoded.readings, batch);
    }

    #[test]
    fn builder_defaults() {
        let service = FeedService::builder().build();
        assert_eq!(service.interval(), Duration::from_secs(2));
        assert_eq!(service.broadcaster().subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_emits_every_interval() {
        let service = service(Duration::from_millis(100));
        let mut sub = service.broadcaster().attach("test");
        let handle = service.start();

        for _ in 0..3 {
            let payload = sub.receiver.recv().await.unwrap();
            assert_eq!(decode_batch(payload.as_bytes()).unwrap().readings.len(), 2);
        }

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_emission() {
        let service = service(Duration::from_millis(100));
        let mut sub = service.broadcaster().attach("test");
        let handle = service.start();

        sub.receiver.recv().await.unwrap();
        handle.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        while sub.receiver.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(sub.receiver.try_recv().is_err());
    }
}
