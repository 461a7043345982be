//! Error types for feed data.

use thiserror::Error;

/// Why a single feed entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The entry is not a JSON object.
    #[error("entry is not an object")]
    NotAnObject,

    /// The entry is well-formed JSON text that does not fit a JSON value,
    /// e.g. a number beyond the range of `f64`.
    #[error("entry is not valid JSON: {0}")]
    InvalidJson(String),

    /// A required field is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or an unparsable value.
    #[error("field `{field}` has an invalid value: {detail}")]
    InvalidField { field: &'static str, detail: String },

    /// The room identifier is empty.
    #[error("room is empty")]
    EmptyRoom,

    /// A measurement is NaN or infinite.
    #[error("field `{0}` is not a finite number")]
    NotFinite(&'static str),
}

/// A rejected entry of a feed message, with its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entry {index}: {reason}")]
pub struct MalformedReading {
    pub index: usize,
    pub reason: MalformedReason,
}

/// Errors that reject a whole feed message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The message is not valid JSON.
    #[cfg(feature = "serde")]
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The message is valid JSON but not an array of readings.
    #[error("expected an array of readings, got {0}")]
    NotAnArray(&'static str),
}
