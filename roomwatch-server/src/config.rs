//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `ROOMWATCH_*` environment variables. Command-line flags are applied on top
//! by the binary.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::broadcaster::DEFAULT_SUBSCRIBER_BUFFER;
use crate::error::ServerError;
use crate::sampler::{SamplerKind, DEFAULT_LEAK_PROBABILITY};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub listen: String,
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    /// Room registry, in emission order.
    pub rooms: Vec<String>,
    pub sampler: SamplerKind,
    pub leak_probability: f64,
    /// Fixed RNG seed for reproducible feeds.
    pub seed: Option<u64>,
    /// Per-subscriber queue depth.
    pub subscriber_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:4000".to_string(),
            interval_ms: 2000,
            rooms: vec![
                "Lobby".to_string(),
                "Kitchen".to_string(),
                "Storage".to_string(),
            ],
            sampler: SamplerKind::Uniform,
            leak_probability: DEFAULT_LEAK_PROBABILITY,
            seed: None,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ServerError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: ServerConfig = builder
            .add_source(
                Environment::with_prefix("ROOMWATCH")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rooms"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.interval_ms == 0 {
            return Err(ServerError::Invalid("interval_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.leak_probability) {
            return Err(ServerError::Invalid(format!(
                "leak_probability must be within [0, 1], got {}",
                self.leak_probability
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
