//! # roomwatch-types
//!
//! Core types shared by the roomwatch feed server and dashboard. This crate
//! defines the reading model that travels over the push feed, the per-room
//! threshold configuration, and (with the `serde` feature) the decoder for
//! incoming feed messages.
//!
//! ## Features
//!
//! - `serde`: JSON serialization of readings and thresholds, plus the
//!   [`decode_batch`] function for validating feed messages entry by entry
//!
//! ## Example
//!
//! ```rust
//! use roomwatch_types::{BatchBuilder, Metric, Threshold};
//!
//! let batch = BatchBuilder::new()
//!     .reading("Lobby", |r| r.temperature(31.0).humidity(50.0))
//!     .reading("Kitchen", |r| r.temperature(22.5).humidity(48.0).leak(true))
//!     .build();
//!
//! assert_eq!(batch.len(), 2);
//!
//! let threshold = Threshold::new(28.0, 70.0);
//! assert!(batch[0].value(Metric::Temperature) > threshold.limit(Metric::Temperature));
//! ```
//!
//! ## Wire format
//!
//! One feed message is a JSON array with one object per room:
//!
//! ```json
//! [{"room":"Lobby","temperature":23.4,"humidity":51.2,"leakDetected":false,"timestamp":"2024-05-01T10:00:00Z"}]
//! ```

mod batch;
mod error;
mod reading;
mod threshold;

#[cfg(feature = "serde")]
mod decode;

pub use batch::*;
pub use error::*;
pub use reading::*;
pub use threshold::*;

#[cfg(feature = "serde")]
pub use decode::*;
