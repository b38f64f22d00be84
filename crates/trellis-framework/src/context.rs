//! Contexts handed to descriptor callbacks.
//!
//! [`RegistrationContext`] is passed by mutable reference into every
//! registration callback; it is the only way a unit can reach the service
//! and extension-point registries, so there is no ambient/global lookup.
//! [`InitContext`] is the owned "resolved dependency bundle" passed into
//! each initialization callback.

use std::any::Any;
use std::sync::Arc;

use trellis_core::{ServiceBundle, ServiceFactory, ServiceRef, ServiceRegistry, ServiceResult};

use crate::error::ExtensionResult;
use crate::extension::{ExtensionPoint, ExtensionPointRegistry};

// =============================================================================
// RegistrationContext
// =============================================================================

/// Build-phase context for a single plugin or module.
///
/// Everything declared here is recorded against the declaring unit and used
/// to compute the initialization order:
///
/// - [`provide`](Self::provide) marks the unit as the provider of a service.
/// - [`depend_on`](Self::depend_on) requests a service in the unit's init
///   bundle and orders the unit after the provider.
/// - [`register_extension_point`](Self::register_extension_point) binds a
///   point owned by this unit.
/// - [`extend`](Self::extend) declares intent to populate a point during
///   init and orders the unit before the point's owner.
pub struct RegistrationContext<'a> {
    unit: &'static str,
    services: &'a mut ServiceRegistry,
    extension_points: &'a ExtensionPointRegistry,
    declared_services: Vec<&'static str>,
    declared_points: Vec<&'static str>,
    provided_services: Vec<&'static str>,
}

/// Everything a registration callback declared, handed back to the manager.
pub(crate) struct Declarations {
    pub(crate) depends_on: Vec<&'static str>,
    pub(crate) extends: Vec<&'static str>,
    pub(crate) provides: Vec<&'static str>,
}

impl<'a> RegistrationContext<'a> {
    pub(crate) fn new(
        unit: &'static str,
        services: &'a mut ServiceRegistry,
        extension_points: &'a ExtensionPointRegistry,
    ) -> Self {
        Self {
            unit,
            services,
            extension_points,
            declared_services: Vec::new(),
            declared_points: Vec::new(),
            provided_services: Vec::new(),
        }
    }

    /// Returns the id of the unit currently registering.
    pub fn unit_id(&self) -> &'static str {
        self.unit
    }

    /// Defines a service factory owned by this unit.
    pub fn provide<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        service: ServiceRef<T>,
        factory: ServiceFactory<T>,
    ) -> ServiceResult<()> {
        self.services.define(service, factory)?;
        self.provided_services.push(service.id());
        Ok(())
    }

    /// Declares a service dependency for this unit's init bundle.
    pub fn depend_on<T: ?Sized>(&mut self, service: ServiceRef<T>) {
        if !self.declared_services.contains(&service.id()) {
            self.declared_services.push(service.id());
        }
    }

    /// Registers an extension point owned by this unit.
    pub fn register_extension_point<T: Any + Send + Sync>(
        &mut self,
        point: ExtensionPoint<T>,
        implementation: T,
    ) -> ExtensionResult<()> {
        self.extension_points
            .register(point, self.unit, implementation)
    }

    /// Declares that this unit will populate `point` during initialization.
    ///
    /// The target is validated after the build phase, once every unit has
    /// had a chance to register its points.
    pub fn extend<T>(&mut self, point: ExtensionPoint<T>) {
        if !self.declared_points.contains(&point.id()) {
            self.declared_points.push(point.id());
        }
    }

    pub(crate) fn into_declarations(self) -> Declarations {
        Declarations {
            depends_on: self.declared_services,
            extends: self.declared_points,
            provides: self.provided_services,
        }
    }
}

// =============================================================================
// InitContext
// =============================================================================

/// Init-phase context for a single plugin or module.
///
/// Owns the unit's resolved [`ServiceBundle`] and a shared handle to the
/// extension-point registry, so the callback future can be `'static`.
pub struct InitContext {
    unit: &'static str,
    services: ServiceBundle,
    extension_points: Arc<ExtensionPointRegistry>,
}

impl InitContext {
    pub(crate) fn new(
        unit: &'static str,
        services: ServiceBundle,
        extension_points: Arc<ExtensionPointRegistry>,
    ) -> Self {
        Self {
            unit,
            services,
            extension_points,
        }
    }

    /// Returns the id of the unit currently initializing.
    pub fn unit_id(&self) -> &'static str {
        self.unit
    }

    /// Returns a declared service from the resolved bundle.
    ///
    /// Only references passed to
    /// [`depend_on`](RegistrationContext::depend_on) during registration are
    /// present; anything else fails with
    /// [`UnresolvedService`](trellis_core::ServiceError::UnresolvedService).
    pub fn service<T: ?Sized + Send + Sync + 'static>(
        &self,
        service: ServiceRef<T>,
    ) -> ServiceResult<Arc<T>> {
        self.services.get(service)
    }

    /// Returns the full resolved bundle.
    pub fn services(&self) -> &ServiceBundle {
        &self.services
    }

    /// Reads an extension point.
    ///
    /// For a point owned by this unit, every contribution is complete and
    /// the point is frozen by the time its init callback runs.
    pub fn with_extension_point<T: Any, R>(
        &self,
        point: ExtensionPoint<T>,
        f: impl FnOnce(&T) -> R,
    ) -> ExtensionResult<R> {
        self.extension_points.with(point, f)
    }

    /// Mutates an extension point declared via
    /// [`extend`](RegistrationContext::extend).
    ///
    /// Fails with
    /// [`ExtensionPointFrozen`](crate::error::ExtensionError::ExtensionPointFrozen)
    /// once the point's owner has begun initialization.
    pub fn with_extension_point_mut<T: Any, R>(
        &self,
        point: ExtensionPoint<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> ExtensionResult<R> {
        self.extension_points.with_mut(point, f)
    }
}

impl std::fmt::Debug for InitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitContext")
            .field("unit", &self.unit)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
