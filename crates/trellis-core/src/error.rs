//! Error types for the service layer.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error type carried by user-supplied callbacks and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while defining or resolving services.
///
/// `Clone` so that concurrent resolvers awaiting the same in-flight
/// construction can each receive the outcome.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// A factory is already bound to this reference id.
    #[error("service '{id}' is already defined")]
    DuplicateService {
        /// Reference id of the colliding definition.
        id: &'static str,
    },

    /// No factory is bound to the requested reference id.
    #[error("no factory defined for service '{id}'")]
    UnresolvedService {
        /// Reference id that could not be resolved.
        id: &'static str,
    },

    /// Resolution revisited a reference already on the current path.
    #[error("cyclic service dependency: {}", path.join(" -> "))]
    CyclicDependency {
        /// The resolution path, ending with the reference that closed the cycle.
        path: Vec<&'static str>,
    },

    /// The stored instance is not of the type the reference claims.
    #[error("service '{id}' is not of the requested type")]
    ServiceTypeMismatch {
        /// Reference id of the mismatched service.
        id: &'static str,
    },

    /// The factory for this service returned an error.
    #[error("constructing service '{id}' failed: {source}")]
    Construction {
        /// Reference id of the failing service.
        id: &'static str,
        /// The factory's error.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
