//! Extension points — named mutable contracts a plugin exposes so unrelated
//! modules can contribute behaviour without compile-time coupling.
//!
//! An [`ExtensionPoint<T>`] is the typed, `Copy` handle; the implementation
//! object of type `T` lives in the [`ExtensionPointRegistry`].  Modules that
//! declared the point mutate it during their initialization callbacks; once
//! the owning unit's own initialization begins the point is frozen and only
//! read access remains.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Default)]
//! pub struct CatalogProcessing {
//!     processors: Vec<Box<dyn ItemProcessor>>,
//! }
//!
//! impl CatalogProcessing {
//!     pub fn add_processor(&mut self, processor: impl ItemProcessor + 'static) {
//!         self.processors.push(Box::new(processor));
//!     }
//! }
//!
//! pub const CATALOG_PROCESSING: ExtensionPoint<CatalogProcessing> =
//!     ExtensionPoint::new("catalog.processing");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ExtensionError, ExtensionResult};

/// A typed, `Copy` handle naming an extension point.
///
/// Like a [`ServiceRef`](trellis_core::ServiceRef), the handle carries only
/// an identifier and a phantom contract type.  The plugin that owns the
/// point exports the constant; contributing modules import it.
pub struct ExtensionPoint<T> {
    id: &'static str,
    _contract: PhantomData<fn(&T)>,
}

impl<T> ExtensionPoint<T> {
    /// Creates a handle with the given id.
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _contract: PhantomData,
        }
    }

    /// Returns the extension-point id.
    pub const fn id(&self) -> &'static str {
        self.id
    }
}

impl<T> Clone for ExtensionPoint<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ExtensionPoint<T> {}

impl<T> std::fmt::Debug for ExtensionPoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExtensionPoint").field(&self.id).finish()
    }
}

struct PointEntry {
    owner: &'static str,
    frozen: bool,
    value: Box<dyn Any + Send + Sync>,
}

/// Holds extension-point implementations, keyed by id.
///
/// Access is closure-based: [`with`](Self::with) for reads,
/// [`with_mut`](Self::with_mut) for mutation during the contribution window.
/// The registry is shared behind an `Arc` between the manager and every
/// initialization context, so interior locking keeps the surface `&self`.
#[derive(Default)]
pub struct ExtensionPointRegistry {
    points: RwLock<HashMap<&'static str, PointEntry>>,
}

impl ExtensionPointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an implementation to a point, owned by `owner`.
    ///
    /// Only reachable through
    /// [`RegistrationContext::register_extension_point`](crate::context::RegistrationContext::register_extension_point),
    /// which supplies the registering unit as the owner; nothing outside the
    /// manager can claim ownership on another unit's behalf.
    ///
    /// Fails with
    /// [`DuplicateExtensionPoint`](ExtensionError::DuplicateExtensionPoint)
    /// if the id is already bound; the first registration is unaffected.
    pub(crate) fn register<T: Any + Send + Sync>(
        &self,
        point: ExtensionPoint<T>,
        owner: &'static str,
        implementation: T,
    ) -> ExtensionResult<()> {
        let mut points = self.points.write();
        if points.contains_key(point.id()) {
            return Err(ExtensionError::DuplicateExtensionPoint { id: point.id() });
        }
        points.insert(
            point.id(),
            PointEntry {
                owner,
                frozen: false,
                value: Box::new(implementation),
            },
        );
        debug!(point = point.id(), owner, "Extension point registered");
        Ok(())
    }

    /// Runs `f` with shared access to the implementation.
    ///
    /// Works before and after the point is frozen.
    pub fn with<T: Any, R>(
        &self,
        point: ExtensionPoint<T>,
        f: impl FnOnce(&T) -> R,
    ) -> ExtensionResult<R> {
        let points = self.points.read();
        let entry = points
            .get(point.id())
            .ok_or(ExtensionError::UnknownExtensionPoint { id: point.id() })?;
        let value = entry
            .value
            .downcast_ref::<T>()
            .ok_or(ExtensionError::ExtensionTypeMismatch { id: point.id() })?;
        Ok(f(value))
    }

    /// Runs `f` with exclusive access to the implementation.
    ///
    /// Fails with
    /// [`ExtensionPointFrozen`](ExtensionError::ExtensionPointFrozen) once
    /// the owning unit's initialization has begun.
    pub fn with_mut<T: Any, R>(
        &self,
        point: ExtensionPoint<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> ExtensionResult<R> {
        let mut points = self.points.write();
        let entry = points
            .get_mut(point.id())
            .ok_or(ExtensionError::UnknownExtensionPoint { id: point.id() })?;
        if entry.frozen {
            return Err(ExtensionError::ExtensionPointFrozen { id: point.id() });
        }
        let value = entry
            .value
            .downcast_mut::<T>()
            .ok_or(ExtensionError::ExtensionTypeMismatch { id: point.id() })?;
        Ok(f(value))
    }

    /// Returns `true` if an implementation is bound to the given id.
    pub fn contains(&self, id: &str) -> bool {
        self.points.read().contains_key(id)
    }

    /// Returns the owner of a point, if registered.
    pub fn owner(&self, id: &str) -> Option<&'static str> {
        self.points.read().get(id).map(|entry| entry.owner)
    }

    /// Returns `true` if the point exists and is frozen.
    pub fn is_frozen(&self, id: &str) -> bool {
        self.points
            .read()
            .get(id)
            .is_some_and(|entry| entry.frozen)
    }

    /// Marks every point owned by `owner` as read-only.
    ///
    /// Called by the manager when the owner's initialization turn begins;
    /// from then on all contributions are complete and visible.
    pub(crate) fn freeze_owned_by(&self, owner: &'static str) {
        let mut points = self.points.write();
        for (id, entry) in points.iter_mut() {
            if entry.owner == owner && !entry.frozen {
                entry.frozen = true;
                debug!(point = id, owner, "Extension point frozen");
            }
        }
    }
}

impl std::fmt::Debug for ExtensionPointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPointRegistry")
            .field("points", &self.points.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pipeline {
        stages: Vec<&'static str>,
    }

    const PIPELINE: ExtensionPoint<Pipeline> = ExtensionPoint::new("test.pipeline");
    const ABSENT: ExtensionPoint<Pipeline> = ExtensionPoint::new("test.absent");
    const WRONG_TYPE: ExtensionPoint<u32> = ExtensionPoint::new("test.pipeline");

    #[test]
    fn test_register_and_mutate() {
        let registry = ExtensionPointRegistry::new();
        registry
            .register(PIPELINE, "owner", Pipeline::default())
            .unwrap();

        registry
            .with_mut(PIPELINE, |p| p.stages.push("validate"))
            .unwrap();
        let stages = registry.with(PIPELINE, |p| p.stages.clone()).unwrap();
        assert_eq!(stages, vec!["validate"]);
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = ExtensionPointRegistry::new();
        registry
            .register(PIPELINE, "owner", Pipeline::default())
            .unwrap();
        let err = registry
            .register(PIPELINE, "other", Pipeline::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ExtensionError::DuplicateExtensionPoint { id: "test.pipeline" }
        ));
        assert_eq!(registry.owner("test.pipeline"), Some("owner"));
    }

    #[test]
    fn test_unknown_point() {
        let registry = ExtensionPointRegistry::new();
        assert!(matches!(
            registry.with(ABSENT, |_| ()),
            Err(ExtensionError::UnknownExtensionPoint { id: "test.absent" })
        ));
    }

    #[test]
    fn test_frozen_blocks_mutation_not_reads() {
        let registry = ExtensionPointRegistry::new();
        registry
            .register(PIPELINE, "owner", Pipeline::default())
            .unwrap();
        registry
            .with_mut(PIPELINE, |p| p.stages.push("validate"))
            .unwrap();

        registry.freeze_owned_by("owner");
        assert!(registry.is_frozen("test.pipeline"));

        assert!(matches!(
            registry.with_mut(PIPELINE, |_| ()),
            Err(ExtensionError::ExtensionPointFrozen { id: "test.pipeline" })
        ));
        let count = registry.with(PIPELINE, |p| p.stages.len()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_type_mismatch() {
        let registry = ExtensionPointRegistry::new();
        registry
            .register(PIPELINE, "owner", Pipeline::default())
            .unwrap();
        assert!(matches!(
            registry.with(WRONG_TYPE, |_| ()),
            Err(ExtensionError::ExtensionTypeMismatch { id: "test.pipeline" })
        ));
    }
}
