//! # roomwatch
//!
//! A terminal dashboard and library for watching room sensor feeds.
//!
//! Readings (temperature, humidity, leak state) arrive as batches from a
//! [`ReadingSource`], are folded into bounded per-room histories by the
//! [`Aggregator`], checked against per-room thresholds, and rendered in an
//! interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │(aggregate)    │(rendering)   │         │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘  │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐   WebSocketSource | StreamSource | ChannelSource
//! │  │ source  │◀──                                             │
//! │  │ (input) │   ReplaySource | SimulatedSource               │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation and operator actions
//! - **[`source`]**: The [`ReadingSource`] trait and its implementations
//! - **[`data`]**: Room histories, alert evaluation, thresholds and statistics
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered [`DashboardConfig`]
//!
//! The feed server and the wire types live in the `roomwatch-server` and
//! `roomwatch-types` crates.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Live feed from a running roomwatch-server
//! roomwatch --connect ws://localhost:4000
//!
//! # Offline, with simulated rooms
//! roomwatch --simulate
//!
//! # Replay a captured feed and export the resulting state
//! roomwatch --replay feed.log --export state.json
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use roomwatch::{Aggregator, App, ChannelSource};
//!
//! let (tx, source) = ChannelSource::create("in-process", 16);
//! let app = App::new(Box::new(source), Aggregator::default());
//! ```
//!
//! ### Aggregating without the UI
//!
//! ```
//! use roomwatch::{Aggregator, ReadingSource, SimulatedSource};
//!
//! let mut source = SimulatedSource::new().backfill(3);
//! let mut aggregator = Aggregator::default();
//! while let Some(batch) = source.poll() {
//!     aggregator.ingest_decoded(batch);
//! }
//! assert_eq!(aggregator.room_count(), 4);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

pub use app::{App, View};
pub use config::DashboardConfig;
pub use data::{
    AggregateStats, Aggregator, Alert, AlertHistory, IngestReport, JsonFileStore, RoomHistory,
    RoomStatus, ThresholdStore, ThresholdUpdate, Thresholds,
};
pub use source::{
    ChannelSource, ReadingSource, ReplaySource, SimulatedSource, StreamSource, WebSocketSource,
};
