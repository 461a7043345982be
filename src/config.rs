//! Dashboard configuration.
//!
//! Layered like the server's: built-in defaults, an optional TOML file, then
//! `ROOMWATCH_DASHBOARD_*` environment variables. Command-line flags are
//! applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::data::{Thresholds, DEFAULT_HISTORY_SIZE};
use crate::source::MAX_BACKFILL;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Feed server URL used by `--connect` when no URL is given.
    pub connect: String,
    pub reconnect_ms: u64,
    /// Readings kept per room.
    pub history_size: usize,
    /// Readings shown in charts and sparklines.
    pub chart_window: usize,
    /// Threshold preset applied before any stored or CLI thresholds.
    pub threshold_preset: String,
    /// Where thresholds are persisted. Unset disables persistence.
    pub thresholds_file: Option<PathBuf>,
    /// How often the source is drained.
    pub refresh_ms: u64,
    /// Spacing between batches when replaying a log.
    pub replay_interval_ms: u64,
    /// Spacing between simulated batches.
    pub simulate_interval_ms: u64,
    /// Batches back-filled when the simulator starts.
    pub simulate_backfill: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            connect: "ws://localhost:4000".to_string(),
            reconnect_ms: 3000,
            history_size: DEFAULT_HISTORY_SIZE,
            chart_window: 10,
            threshold_preset: "dashboard".to_string(),
            thresholds_file: None,
            refresh_ms: 250,
            replay_interval_ms: 2000,
            simulate_interval_ms: 3000,
            simulate_backfill: 10,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: DashboardConfig = builder
            .add_source(Environment::with_prefix("ROOMWATCH_DASHBOARD").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::Message("history_size must be positive".into()));
        }
        if self.chart_window == 0 {
            return Err(ConfigError::Message("chart_window must be positive".into()));
        }
        if self.refresh_ms == 0 {
            return Err(ConfigError::Message("refresh_ms must be positive".into()));
        }
        if self.simulate_backfill > MAX_BACKFILL {
            return Err(ConfigError::Message(format!(
                "simulate_backfill must be at most {}",
                MAX_BACKFILL
            )));
        }
        Thresholds::preset(&self.threshold_preset)
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(())
    }

    /// The starting threshold map for the configured preset.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::preset(&self.threshold_preset).unwrap_or_default()
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_ms)
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    pub fn simulate_interval(&self) -> Duration {
        Duration::from_millis(self.simulate_interval_ms)
    }
}
