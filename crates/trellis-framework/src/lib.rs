//! # Trellis Framework
//!
//! The composition layer of the Trellis framework.
//!
//! This layer turns the service primitives from `trellis-core` into a full
//! plugin system:
//!
//! - **Descriptors** declare a plugin or module: an id plus registration and
//!   initialization callbacks ([`PluginDescriptor`], [`ModuleDescriptor`])
//! - **Extension points** let a plugin expose a typed contract that
//!   unrelated modules populate during startup ([`ExtensionPoint`],
//!   [`ExtensionPointRegistry`])
//! - **The manager** orders and drives the whole startup: registration
//!   callbacks in insertion order, then initialization callbacks in
//!   dependency order, all-or-nothing ([`PluginManager`])
//!
//! Hosts that also want configuration loading, logging setup, and signal
//! handling should use `trellis-runtime` instead of driving the manager
//! directly.

pub mod context;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod manager;

pub use context::{InitContext, RegistrationContext};
pub use descriptor::{ModuleDescriptor, PluginDescriptor};
pub use error::{ExtensionError, ExtensionResult, ManagerError, ManagerResult};
pub use extension::{ExtensionPoint, ExtensionPointRegistry};
pub use manager::PluginManager;
