//! The reading pipeline on the client side.
//!
//! ## Submodules
//!
//! - [`aggregator`]: The [`Aggregator`] owning all per-session state
//! - [`alert`]: Pure alert evaluation and the append-only [`AlertHistory`]
//! - [`history`]: Bounded per-room [`RoomHistory`] with sparkline helpers
//! - [`stats`]: [`AggregateStats`] derived from the current histories
//! - [`thresholds`]: Per-room limits, presets, updates and persistence
//!
//! ## Data Flow
//!
//! ```text
//! DecodedBatch (from a ReadingSource)
//!        │
//!        ▼
//! Aggregator::ingest()
//!        │
//!        ├──▶ RoomHistory::push() (bounded, per room)
//!        │
//!        ├──▶ alert::evaluate() ──▶ AlertHistory + notification
//!        │
//!        └──▶ RoomStatus (Unknown → Normal ↔ Alerting)
//!
//! Aggregator::compute_stats() ──▶ AggregateStats
//! ```

pub mod aggregator;
pub mod alert;
pub mod history;
pub mod stats;
pub mod thresholds;

pub use aggregator::{Aggregator, IngestReport, RoomStatus};
pub use alert::{breached_metric, evaluate, format_message, Alert, AlertHistory};
pub use history::{RoomHistory, DEFAULT_HISTORY_SIZE};
pub use stats::AggregateStats;
pub use thresholds::{
    ConfigError, JsonFileStore, StoreError, ThresholdStore, ThresholdUpdate, Thresholds,
    STORAGE_KEY,
};
