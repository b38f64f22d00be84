//! Error types for extension points and lifecycle orchestration.

use thiserror::Error;

use trellis_core::{BoxError, ServiceError};

/// Errors that can occur while registering or accessing extension points.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// An implementation is already bound to this extension-point id.
    #[error("extension point '{id}' is already registered")]
    DuplicateExtensionPoint {
        /// Id of the colliding registration.
        id: &'static str,
    },

    /// No implementation is bound to the requested id.
    #[error("unknown extension point '{id}'")]
    UnknownExtensionPoint {
        /// Id that could not be found.
        id: &'static str,
    },

    /// The point's owner has begun initialization; mutation is no longer
    /// allowed.
    #[error("extension point '{id}' is frozen")]
    ExtensionPointFrozen {
        /// Id of the frozen point.
        id: &'static str,
    },

    /// The stored implementation is not of the type the handle claims.
    #[error("extension point '{id}' is not of the requested type")]
    ExtensionTypeMismatch {
        /// Id of the mismatched point.
        id: &'static str,
    },
}

/// Result type for extension-point operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Errors surfaced by the plugin manager during registration or startup.
///
/// All of these are configuration-time programmer errors; none are retried.
/// They fail the whole startup and carry the offending plugin, module, or
/// service identifier.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// A plugin or module with this id is already enqueued.
    #[error("a plugin or module with id '{id}' is already registered")]
    DuplicateId {
        /// The colliding identifier.
        id: &'static str,
    },

    /// A module names a parent plugin that has not been registered.
    #[error("module '{module}' names unregistered parent plugin '{parent}'")]
    ModuleWithoutParent {
        /// Id of the module being added.
        module: &'static str,
        /// The missing parent plugin id.
        parent: &'static str,
    },

    /// Descriptors cannot be added and `start` cannot run twice.
    #[error("the manager has already been started")]
    AlreadyStarted,

    /// A registration callback returned an error.
    #[error("registration of '{unit}' failed: {source}")]
    Registration {
        /// Id of the failing plugin or module.
        unit: &'static str,
        /// The callback's error.
        #[source]
        source: BoxError,
    },

    /// A unit declared it extends a point nothing registered.
    #[error("'{unit}' extends unknown extension point '{point}'")]
    UnknownExtensionPoint {
        /// Id of the declaring unit.
        unit: &'static str,
        /// The missing extension-point id.
        point: &'static str,
    },

    /// Declared dependencies form a cycle; no initialization order exists.
    #[error("initialization dependency cycle among: {}", units.join(", "))]
    DependencyCycle {
        /// Ids of the units still blocked when ordering stalled.
        units: Vec<String>,
    },

    /// Resolving a unit's declared services failed.
    #[error("resolving services for '{unit}' failed: {source}")]
    Service {
        /// Id of the unit whose bundle could not be built.
        unit: &'static str,
        /// The underlying service error.
        #[source]
        source: ServiceError,
    },

    /// An initialization callback returned an error; startup is aborted.
    #[error("initialization of '{unit}' failed: {source}")]
    Initialization {
        /// Id of the first failing plugin or module.
        unit: &'static str,
        /// The callback's error.
        #[source]
        source: BoxError,
    },
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
