//! # Trellis
//!
//! A type-safe plugin composition framework for Rust backends.
//!
//! ## Overview
//!
//! Trellis lets an application be assembled from plugins that share
//! behaviour without depending on each other at compile time.  Plugins
//! provide **services** (singletons constructed on demand, in dependency
//! order) and expose **extension points** (typed contracts other modules
//! populate during startup).  A central manager drives an all-or-nothing
//! startup in three phases.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   add_plugin/add_module   ┌──────────────────────────────┐
//! │   Runtime    │──────────────────────────▶│ PluginManager                │
//! │ (config +    │                           │  1. registration callbacks   │
//! │  logging +   │        start()            │  2. topological ordering     │
//! │  signals)    │──────────────────────────▶│  3. init callbacks, ordered  │
//! └──────────────┘                           └───────────┬──────────────────┘
//!                                                        │
//!                                  ┌─────────────────────┴───────────────┐
//!                                  ▼                                     ▼
//!                        ServiceRegistry                     ExtensionPointRegistry
//!                 (memoized, cycle-checked DI)          (typed contracts, freeze-on-init)
//! ```
//!
//! - **Runtime**: loads configuration, initializes logging, waits for signals
//! - **Plugins**: top-level units providing services and extension points
//! - **Modules**: units extending one parent plugin's extension points
//! - **Services**: lazily constructed singletons shared through typed handles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! const GREETER: ServiceRef<Greeter> = ServiceRef::new("demo.greeter");
//!
//! fn demo_plugin() -> PluginDescriptor {
//!     PluginDescriptor::new("demo")
//!         .on_register(|ctx| {
//!             ctx.provide(GREETER, ServiceFactory::new(|_| async {
//!                 Ok(Arc::new(Greeter::default()))
//!             }))?;
//!             Ok(())
//!         })
//!         .on_init(|ctx| async move {
//!             info!(unit = ctx.unit_id(), "Ready");
//!             Ok(())
//!         })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = TrellisRuntime::new();
//!     runtime.add_plugin(demo_plugin())?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: newline-delimited JSON log output

pub use trellis_core as core;
pub use trellis_framework as framework;
pub use trellis_runtime as runtime;

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for composing applications:
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use trellis_runtime::{CONFIG_SERVICE, ConfigService, TrellisRuntime};

    // Descriptors - the units the manager orchestrates
    pub use trellis_framework::{ModuleDescriptor, PluginDescriptor, PluginManager};

    // Contexts - passed into descriptor callbacks
    pub use trellis_framework::{InitContext, RegistrationContext};

    // Extension points - typed contracts between plugins and modules
    pub use trellis_framework::{ExtensionPoint, ExtensionPointRegistry};

    // Services - typed handles and factories
    pub use trellis_core::{ServiceFactory, ServiceRef, ServiceRegistry};

    // Errors
    pub use trellis_core::{BoxError, ServiceError};
    pub use trellis_framework::{ExtensionError, ManagerError};
    pub use trellis_runtime::RuntimeError;

    // Logging macros
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
