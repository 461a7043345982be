//! Feed message decoding.
//!
//! A feed message is decoded leniently: the message itself must be a JSON
//! array, but each entry is validated on its own so that one malformed
//! reading never costs the rest of the batch.

use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::{Batch, DecodeError, MalformedReading, MalformedReason, Reading};

/// The result of decoding one feed message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    /// Entries that decoded into valid readings, in message order.
    pub readings: Batch,
    /// Entries that were rejected, with their index in the message.
    pub rejected: Vec<MalformedReading>,
}

impl DecodedBatch {
    /// Wrap readings that are already typed (e.g. from an in-process generator).
    pub fn from_readings(readings: Batch) -> Self {
        Self {
            readings,
            rejected: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty() && self.rejected.is_empty()
    }
}

/// Decode a feed message from raw bytes.
///
/// # Example
///
/// ```rust
/// use roomwatch_types::decode_batch;
///
/// let message = br#"[
///     {"room":"Lobby","temperature":"23.4","humidity":51.2,"leakDetected":false,"timestamp":"2024-05-01T10:00:00.000Z"},
///     {"room":"Kitchen","humidity":48.0,"leakDetected":false,"timestamp":"2024-05-01T10:00:00.000Z"}
/// ]"#;
///
/// let batch = decode_batch(message).unwrap();
/// assert_eq!(batch.readings.len(), 1);
/// assert_eq!(batch.rejected.len(), 1);
/// assert_eq!(batch.rejected[0].index, 1);
/// ```
pub fn decode_batch(bytes: &[u8]) -> Result<DecodedBatch, DecodeError> {
    // Only the message's syntax is checked here; entries are parsed one by one
    let message: &RawValue = serde_json::from_slice(bytes)?;
    let text = message.get().trim_start();
    if !text.starts_with('[') {
        return Err(DecodeError::NotAnArray(raw_kind(text)));
    }
    let entries: Vec<&RawValue> = serde_json::from_str(text)?;

    let mut batch = DecodedBatch::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let decoded = serde_json::from_str::<Value>(entry.get())
            .map_err(|e| MalformedReason::InvalidJson(e.to_string()))
            .and_then(|value| decode_reading(&value));
        match decoded {
            Ok(reading) => batch.readings.push(reading),
            Err(reason) => batch.rejected.push(MalformedReading { index, reason }),
        }
    }
    Ok(batch)
}

/// Encode a batch as one feed message.
pub fn encode_batch(batch: &Batch) -> serde_json::Result<String> {
    serde_json::to_string(batch)
}

/// Decode a single feed entry.
///
/// `temperature` and `humidity` accept JSON numbers as well as numeric
/// strings such as `"23.4"`.
pub fn decode_reading(value: &Value) -> Result<Reading, MalformedReason> {
    let object = value.as_object().ok_or(MalformedReason::NotAnObject)?;

    let room = match field(object, "room")? {
        Value::String(room) => room.clone(),
        other => return Err(invalid("room", format!("expected string, got {}", kind(other)))),
    };
    let temperature = number_field(object, "temperature")?;
    let humidity = number_field(object, "humidity")?;
    let leak_detected = match field(object, "leakDetected")? {
        Value::Bool(leak) => *leak,
        other => {
            return Err(invalid(
                "leakDetected",
                format!("expected boolean, got {}", kind(other)),
            ))
        }
    };
    let timestamp = match field(object, "timestamp")? {
        Value::String(ts) => DateTime::parse_from_rfc3339(ts)
            .map_err(|e| invalid("timestamp", e.to_string()))?
            .with_timezone(&Utc),
        other => {
            return Err(invalid(
                "timestamp",
                format!("expected ISO-8601 string, got {}", kind(other)),
            ))
        }
    };

    let reading = Reading::new(room, temperature, humidity, leak_detected, timestamp);
    reading.validate()?;
    Ok(reading)
}

fn field<'a>(object: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, MalformedReason> {
    match object.get(name) {
        None | Some(Value::Null) => Err(MalformedReason::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn number_field(object: &Map<String, Value>, name: &'static str) -> Result<f64, MalformedReason> {
    match field(object, name)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(name, format!("{} is not representable as f64", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(name, format!("`{}`: {}", s, e))),
        other => Err(invalid(name, format!("expected number, got {}", kind(other)))),
    }
}

fn invalid(field: &'static str, detail: String) -> MalformedReason {
    MalformedReason::InvalidField { field, detail }
}

/// JSON kind of a syntactically valid value, from its first character.
fn raw_kind(text: &str) -> &'static str {
    match text.as_bytes().first() {
        Some(b'{') => "object",
        Some(b'[') => "array",
        Some(b'"') => "string",
        Some(b't' | b'f') => "boolean",
        Some(b'n') => "null",
        _ => "number",
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
