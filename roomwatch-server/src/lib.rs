//! # roomwatch-server
//!
//! Generates simulated room sensor readings on a fixed tick and pushes each
//! batch to every connected WebSocket client.
//!
//! ```text
//! ┌───────────┐  tick   ┌───────────┐  batch  ┌─────────────┐  text frame  ┌─────────┐
//! │  Sampler  │ ──────▶ │ Generator │ ──────▶ │ Broadcaster │ ───────────▶ │ clients │
//! └───────────┘         └───────────┘         └─────────────┘              └─────────┘
//! ```
//!
//! The [`FeedService`] owns the generator and the timer; the [`server::serve`]
//! loop attaches each accepted connection to the service's [`Broadcaster`].

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod generator;
pub mod sampler;
pub mod server;
pub mod service;

pub use broadcaster::{Broadcaster, DeliveryReport, Payload, SubscriberId, Subscription};
pub use config::ServerConfig;
pub use error::ServerError;
pub use generator::Generator;
pub use sampler::{
    ConstantSampler, RandomWalkSampler, Sample, Sampler, SamplerKind, UniformSampler,
};
pub use service::{FeedService, FeedServiceBuilder, TickHandle};

pub use roomwatch_types::{Batch, Reading};
