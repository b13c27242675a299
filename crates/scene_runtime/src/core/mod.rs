//! # Core Runtime Module
//!
//! Shared configuration for the runtime subsystems.
//!
//! ## Organization
//!
//! - **Config**: Engine, runtime loop and serialization settings

pub mod config;

pub use config::{EngineConfig, RuntimeConfig, SerializationConfig};
pub use crate::config::{Config, ConfigError};
