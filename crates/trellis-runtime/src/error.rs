//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin's configuration section could not be deserialized.
    #[error("Failed to deserialize plugin config: {0}")]
    PluginConfigDeserialize(String),

    /// Registration or startup failed in the plugin manager.
    #[error("Manager error: {0}")]
    Manager(#[from] trellis_framework::ManagerError),

    /// A service operation failed.
    #[error("Service error: {0}")]
    Service(#[from] trellis_core::ServiceError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
