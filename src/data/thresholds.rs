//! Per-room threshold configuration and its persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roomwatch_types::{Metric, Threshold};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key under which the threshold map is persisted.
pub const STORAGE_KEY: &str = "thresholds";

/// Errors from threshold updates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold for {room} {metric} must be a finite number, got {value}")]
    NonFinite {
        room: String,
        metric: Metric,
        value: f64,
    },

    #[error("invalid threshold update `{0}` (expected Room.field=value)")]
    Syntax(String),

    #[error("unknown threshold field `{0}` (expected temp or humidity)")]
    UnknownField(String),

    #[error("invalid threshold value `{value}`: {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("room name is empty")]
    EmptyRoom,

    #[error("unknown threshold preset `{0}` (expected dashboard or settings)")]
    UnknownPreset(String),
}

/// Errors from loading or saving thresholds.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("threshold store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("threshold store contains invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Threshold limits keyed by room name.
///
/// Rooms without an entry have no limits and never alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds {
    rooms: BTreeMap<String, Threshold>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// The limits shown on the main dashboard.
    pub fn dashboard_defaults() -> Self {
        [
            ("Living Room", Threshold::new(28.0, 70.0)),
            ("Kitchen", Threshold::new(30.0, 75.0)),
            ("Bedroom", Threshold::new(26.0, 65.0)),
            ("Office", Threshold::new(29.0, 72.0)),
        ]
        .into_iter()
        .collect()
    }

    /// The smaller set used by the settings screen.
    pub fn settings_defaults() -> Self {
        [
            ("Living Room", Threshold::new(28.0, 70.0)),
            ("Kitchen", Threshold::new(30.0, 75.0)),
        ]
        .into_iter()
        .collect()
    }

    /// Look up a named preset: `dashboard`, `settings` or `none`.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Self::dashboard_defaults()),
            "settings" => Ok(Self::settings_defaults()),
            "none" | "empty" => Ok(Self::new()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    pub fn get(&self, room: &str) -> Option<&Threshold> {
        self.rooms.get(room)
    }

    /// Set one limit for one room.
    ///
    /// Non-finite values are rejected and the previous limit is kept.
    pub fn set(&mut self, room: &str, metric: Metric, value: f64) -> Result<(), ConfigError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(ConfigError::EmptyRoom);
        }
        if !value.is_finite() {
            return Err(ConfigError::NonFinite {
                room: room.to_string(),
                metric,
                value,
            });
        }
        self.rooms
            .entry(room.to_string())
            .or_default()
            .set(metric, value);
        Ok(())
    }

    pub fn apply(&mut self, update: &ThresholdUpdate) -> Result<(), ConfigError> {
        self.set(&update.room, update.metric, update.value)
    }

    pub fn insert(&mut self, room: impl Into<String>, threshold: Threshold) {
        self.rooms.insert(room.into(), threshold);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Threshold)> {
        self.rooms.iter().map(|(room, t)| (room.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Threshold)> for Thresholds {
    fn from_iter<I: IntoIterator<Item = (S, Threshold)>>(iter: I) -> Self {
        Self {
            rooms: iter.into_iter().map(|(room, t)| (room.into(), t)).collect(),
        }
    }
}

/// A single threshold change written as `Room.field=value`.
///
/// The room is everything before the last `.`, so room names may contain
/// spaces and dots.
///
/// ```rust
/// use roomwatch::data::ThresholdUpdate;
/// use roomwatch_types::Metric;
///
/// let update: ThresholdUpdate = "Living Room.temp=27.5".parse().unwrap();
/// assert_eq!(update.room, "Living Room");
/// assert_eq!(update.metric, Metric::Temperature);
/// assert_eq!(update.value, 27.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdUpdate {
    pub room: String,
    pub metric: Metric,
    pub value: f64,
}

impl ThresholdUpdate {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| ConfigError::Syntax(input.to_string()))?;
        let (room, field) = key
            .rsplit_once('.')
            .ok_or_else(|| ConfigError::Syntax(input.to_string()))?;

        let room = room.trim();
        if room.is_empty() {
            return Err(ConfigError::EmptyRoom);
        }
        let metric: Metric = field
            .parse()
            .map_err(|_| ConfigError::UnknownField(field.trim().to_string()))?;

        let value_str = value.trim();
        let value: f64 = value_str.parse().map_err(|e: std::num::ParseFloatError| {
            ConfigError::InvalidValue {
                value: value_str.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !value.is_finite() {
            return Err(ConfigError::NonFinite {
                room: room.to_string(),
                metric,
                value,
            });
        }

        Ok(Self {
            room: room.to_string(),
            metric,
            value,
        })
    }
}

impl FromStr for ThresholdUpdate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// External persistence for the threshold map.
pub trait ThresholdStore: Send + std::fmt::Debug {
    /// Load the stored map. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<Thresholds>, StoreError>;

    fn save(&self, thresholds: &Thresholds) -> Result<(), StoreError>;

    /// Human-readable location, for status messages.
    fn location(&self) -> String;
}

/// Stores thresholds as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store under `<dir>/thresholds.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(format!("{}.json", STORAGE_KEY)))
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThresholdStore for JsonFileStore {
    fn load(&self) -> Result<Option<Thresholds>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, thresholds: &Thresholds) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(thresholds)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let dashboard = Thresholds::preset("dashboard").unwrap();
        assert_eq!(dashboard.len(), 4);
        assert_eq!(dashboard.get("Bedroom"), Some(&Threshold::new(26.0, 65.0)));

        let settings = Thresholds::preset("settings").unwrap();
        assert_eq!(settings.len(), 2);
        assert!(settings.get("Office").is_none());

        assert!(Thresholds::preset("none").unwrap().is_empty());
        assert!(matches!(
            Thresholds::preset("winter"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn set_creates_partial_threshold() {
        let mut thresholds = Thresholds::new();
        thresholds.set("Attic", Metric::Humidity, 60.0).unwrap();

        let attic = thresholds.get("Attic").unwrap();
        assert_eq!(attic.humidity, Some(60.0));
        assert_eq!(attic.temp, None);
    }

    #[test]
    fn set_keeps_other_metric() {
        let mut thresholds = Thresholds::dashboard_defaults();
        thresholds.set("Kitchen", Metric::Temperature, 32.0).unwrap();
        assert_eq!(thresholds.get("Kitchen"), Some(&Threshold::new(32.0, 75.0)));
    }

    #[test]
    fn non_finite_value_keeps_previous() {
        let mut thresholds = Thresholds::dashboard_defaults();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = thresholds.set("Kitchen", Metric::Temperature, bad).unwrap_err();
            assert!(matches!(err, ConfigError::NonFinite { .. }));
        }
        assert_eq!(thresholds.get("Kitchen").unwrap().temp, Some(30.0));
    }

    #[test]
    fn parse_updates() {
        let update = ThresholdUpdate::parse("Kitchen.humidity = 80").unwrap();
        assert_eq!(update.room, "Kitchen");
        assert_eq!(update.metric, Metric::Humidity);
        assert_eq!(update.value, 80.0);

        let update = ThresholdUpdate::parse("St. Mary's.temperature=21").unwrap();
        assert_eq!(update.room, "St. Mary's");
    }

    #[test]
    fn parse_rejects_bad_updates() {
        assert!(matches!(
            ThresholdUpdate::parse("Kitchen"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            ThresholdUpdate::parse("Kitchen=30"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            ThresholdUpdate::parse("Kitchen.pressure=30"),
            Err(ConfigError::UnknownField(f)) if f == "pressure"
        ));
        assert!(matches!(
            ThresholdUpdate::parse("Kitchen.temp=warm"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ThresholdUpdate::parse("Kitchen.temp=NaN"),
            Err(ConfigError::NonFinite { .. })
        ));
        assert!(matches!(
            ThresholdUpdate::parse(".temp=30"),
            Err(ConfigError::EmptyRoom)
        ));
    }

    #[test]
    fn json_shape_matches_room_map() {
        let mut thresholds = Thresholds::new();
        thresholds.insert("Kitchen", Threshold::new(30.0, 75.0));
        thresholds.set("Attic", Metric::Temperature, 25.0).unwrap();

        let json = serde_json::to_value(&thresholds).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Attic": {"temp": 25.0},
                "Kitchen": {"temp": 30.0, "humidity": 75.0}
            })
        );
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.path(), dir.path().join("thresholds.json"));

        assert!(store.load().unwrap().is_none());

        let thresholds = Thresholds::dashboard_defaults();
        store.save(&thresholds).unwrap();
        assert_eq!(store.load().unwrap(), Some(thresholds));
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::at(dir.path().join("nested/deeper/limits.json"));
        store.save(&Thresholds::settings_defaults()).unwrap();
        assert!(store.path().exists());
    }
}
