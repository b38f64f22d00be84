//! Main runtime orchestration.
//!
//! [`TrellisRuntime`] wraps a [`PluginManager`] with the concerns a real
//! host needs around it: configuration loading, logging initialization,
//! host-defined services, and signal-driven shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trellis_runtime::TrellisRuntime;
//!
//! // Simplest way - auto-loads config from the current directory
//! let mut runtime = TrellisRuntime::new();
//!
//! // Custom configuration path
//! let mut runtime = TrellisRuntime::builder()
//!     .config_file("config/trellis.toml")
//!     .build()?;
//!
//! runtime.add_plugin(catalog_plugin())?;
//! runtime.run().await?;
//! ```

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use trellis_core::ServiceFactory;
use trellis_framework::{ModuleDescriptor, PluginDescriptor, PluginManager};

use crate::config::{ConfigLoader, TrellisConfig};
use crate::error::RuntimeResult;
use crate::logging;
use crate::service::{CONFIG_SERVICE, ConfigService};

/// The main Trellis runtime: a plugin manager plus the host ambient stack.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new().file("trellis.toml").load()?;
/// let mut runtime = TrellisRuntime::from_config(&config);
/// runtime.add_plugin(catalog_plugin())?;
/// runtime.add_module(tagging_module())?;
/// runtime.run().await?;
/// ```
pub struct TrellisRuntime {
    /// The loaded configuration.
    config: TrellisConfig,
    /// The plugin manager driving composition.
    manager: PluginManager,
}

impl TrellisRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// This will:
    /// 1. Search for `trellis.toml` / `trellis.yaml` in the current directory
    /// 2. Initialize logging based on the configuration
    ///
    /// If no configuration file is found, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                TrellisConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a new runtime from configuration.
    ///
    /// Initializes logging based on the configuration (idempotent if a
    /// subscriber is already installed).
    pub fn from_config(config: &TrellisConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            plugin_sections = config.plugins.len(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            manager: PluginManager::new(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Returns a reference to the underlying plugin manager.
    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    /// Mutable access to the underlying plugin manager.
    ///
    /// Hosts use this to define additional services of their own before
    /// [`start`](Self::start).
    pub fn manager_mut(&mut self) -> &mut PluginManager {
        &mut self.manager
    }

    /// Enqueues a plugin descriptor.
    pub fn add_plugin(&mut self, descriptor: PluginDescriptor) -> RuntimeResult<()> {
        self.manager.add_plugin(descriptor)?;
        Ok(())
    }

    /// Enqueues a module descriptor.
    pub fn add_module(&mut self, descriptor: ModuleDescriptor) -> RuntimeResult<()> {
        self.manager.add_module(descriptor)?;
        Ok(())
    }

    /// Starts the composition.
    ///
    /// Defines the host services (the configuration service under
    /// [`CONFIG_SERVICE`]) and then drives the manager's startup phases.
    pub async fn start(&mut self) -> RuntimeResult<()> {
        let config_service = ConfigService::new(self.config.plugins.clone());
        self.manager
            .services_mut()
            .define(CONFIG_SERVICE, ServiceFactory::instance(Arc::new(config_service)))?;

        self.manager.start().await?;

        info!("Trellis runtime started");
        Ok(())
    }

    /// Runs the runtime until a shutdown signal is received.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Trellis runtime is now running. Press Ctrl+C to stop.");
        Self::wait_for_shutdown().await;

        info!("Trellis runtime stopped");
        Ok(())
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;

        info!("Trellis runtime stopped");
        Ok(())
    }

    /// Waits for shutdown signals (Ctrl+C or SIGTERM).
    async fn wait_for_shutdown() {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");

            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
        }
    }
}

impl Default for TrellisRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`TrellisRuntime`] with custom configuration sources.
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime = TrellisRuntime::builder()
///     .config_file("config/trellis.yaml")
///     .build()?;
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    config_file: Option<std::path::PathBuf>,
    overrides: Option<TrellisConfig>,
}

impl RuntimeBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Merges programmatic configuration over the loaded sources.
    pub fn with_config(mut self, config: TrellisConfig) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Loads configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<TrellisRuntime> {
        let mut loader = ConfigLoader::new().with_current_dir();
        if let Some(path) = self.config_file {
            loader = loader.file(path);
        }
        if let Some(overrides) = self.overrides {
            loader = loader.merge(overrides);
        }

        let config = loader.load()?;
        Ok(TrellisRuntime::from_config(&config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct CatalogConfig {
        #[serde(default)]
        page_size: usize,
    }

    #[tokio::test]
    async fn test_config_service_reaches_plugins() {
        let mut config = TrellisConfig::default();
        config
            .plugins
            .insert("catalog".to_string(), serde_json::json!({ "page_size": 25 }));

        let observed = Arc::new(Mutex::new(CatalogConfig::default()));
        let observed_in_init = Arc::clone(&observed);

        let mut runtime = TrellisRuntime::from_config(&config);
        runtime
            .add_plugin(
                PluginDescriptor::new("catalog")
                    .on_register(|ctx| {
                        ctx.depend_on(CONFIG_SERVICE);
                        Ok(())
                    })
                    .on_init(move |ctx| async move {
                        let config = ctx.service(CONFIG_SERVICE)?;
                        *observed_in_init.lock() = config.get("catalog")?;
                        Ok(())
                    }),
            )
            .unwrap();

        runtime.start().await.unwrap();
        assert_eq!(*observed.lock(), CatalogConfig { page_size: 25 });
    }

    #[tokio::test]
    async fn test_run_until_completes_startup() {
        let config = TrellisConfig::default();
        let mut runtime = TrellisRuntime::from_config(&config);
        runtime.add_plugin(PluginDescriptor::new("noop")).unwrap();

        runtime.run_until(async {}).await.unwrap();
        assert!(runtime.manager().is_started());
    }
}
