//! Configuration module for the Trellis runtime.
//!
//! Loads layered configuration (defaults, file, environment) into
//! [`TrellisConfig`]: logging settings for the host plus opaque per-plugin
//! sections the runtime hands out through the configuration service.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, TrellisConfig};
