//! # Unified Configuration
//!
//! Configuration for the engine facade, the simulation loop and the scene
//! serializer. All structures are serializable so they can be stored as TOML
//! or RON through the [`Config`] trait.

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::serialization::DecodePolicy;

/// # Runtime Loop Configuration
///
/// Pacing of the background simulation thread. Step cadence is otherwise
/// owned by whoever drives the runtime; these settings only bound it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Target ticks per second. `None` steps as fast as possible.
    pub tick_rate: Option<u32>,
    /// Upper bound for a single delta time in seconds
    pub max_delta_seconds: f32,
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self {
            tick_rate: None,
            max_delta_seconds: 0.25,
        }
    }

    /// Set target tick rate
    pub fn with_tick_rate(mut self, ticks_per_second: u32) -> Self {
        self.tick_rate = Some(ticks_per_second);
        self
    }

    /// Set maximum delta time
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta_seconds = seconds;
        self
    }

    /// Interval between ticks, if paced
    pub fn tick_interval(&self) -> Option<std::time::Duration> {
        self.tick_rate
            .filter(|rate| *rate > 0)
            .map(|rate| std::time::Duration::from_secs_f64(1.0 / f64::from(rate)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == Some(0) {
            return Err(ConfigError::Invalid("tick_rate must be at least 1".to_string()));
        }
        if !(self.max_delta_seconds > 0.0) {
            return Err(ConfigError::Invalid("max_delta_seconds must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Serialization Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// What to do with a component whose stored value cannot be decoded
    pub decode_policy: DecodePolicy,
    /// Write human-readable scene files
    pub pretty: bool,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            decode_policy: DecodePolicy::default(),
            pretty: true,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all runtime subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter for the engine (`env_logger` syntax)
    pub log_level: String,
    /// Simulation loop settings
    pub runtime: RuntimeConfig,
    /// Scene file settings
    pub serialization: SerializationConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            runtime: RuntimeConfig::default(),
            serialization: SerializationConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set runtime loop configuration
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Set decode policy
    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.serialization.decode_policy = policy;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }
        self.runtime.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let config = EngineConfig::new().with_runtime(RuntimeConfig::new().with_tick_rate(0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_tick_interval() {
        let runtime = RuntimeConfig::new().with_tick_rate(50);
        assert_eq!(runtime.tick_interval(), Some(std::time::Duration::from_millis(20)));
        assert_eq!(RuntimeConfig::new().tick_interval(), None);
    }

    #[test]
    fn test_toml_roundtrip_through_files() {
        let dir = std::env::temp_dir().join(format!("scene_runtime_cfg_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.toml");

        let config = EngineConfig::new()
            .with_log_level("debug")
            .with_runtime(RuntimeConfig::new().with_tick_rate(30))
            .with_decode_policy(DecodePolicy::SkipComponent);
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.runtime.tick_rate, Some(30));
        assert_eq!(loaded.serialization.decode_policy, DecodePolicy::SkipComponent);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unsupported_extension() {
        let result = EngineConfig::load_from_file("engine.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
