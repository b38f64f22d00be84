//! Trellis Runtime - Orchestration layer for the Trellis composition framework.
//!
//! This crate provides:
//! - Runtime orchestration (`TrellisRuntime`)
//! - Layered configuration loading (defaults, file, environment)
//! - Logging configuration
//! - Host-defined services (the configuration service)
//!
//! ```ignore
//! use trellis_runtime::TrellisRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Runtime automatically loads trellis.toml and initializes logging
//!     let mut runtime = TrellisRuntime::new();
//!
//!     runtime.add_plugin(catalog_plugin())?;
//!     runtime.add_module(tagging_module())?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from `trellis.toml` / `trellis.yaml` (depending
//! on enabled features), overridden by `TRELLIS_*` environment variables.
//! The `plugins` table holds one opaque section per plugin id, exposed to
//! plugins through [`ConfigService`].

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod service;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, TrellisConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, TrellisRuntime};
pub use service::{CONFIG_SERVICE, ConfigService};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
