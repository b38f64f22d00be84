//! [`ServiceRef<T>`] — typed handles for requesting services.

use std::marker::PhantomData;

/// A typed, `Copy` handle naming a service.
///
/// A `ServiceRef` carries only an identifier and a phantom capability type;
/// it never owns an implementation.  The plugin that defines the service owns
/// the reference constant, and every consumer imports it to declare a
/// dependency without depending on a concrete construction path.
///
/// `T` may be a concrete type or a `dyn Trait` object.
///
/// # Example
///
/// ```rust,ignore
/// pub trait CatalogStore: Send + Sync {
///     fn lookup(&self, id: &str) -> Option<Item>;
/// }
///
/// pub const CATALOG_STORE: ServiceRef<dyn CatalogStore> =
///     ServiceRef::new("catalog.store");
/// ```
pub struct ServiceRef<T: ?Sized> {
    id: &'static str,
    _capability: PhantomData<fn(&T)>,
}

impl<T: ?Sized> ServiceRef<T> {
    /// Creates a reference with the given id.
    ///
    /// `const` so references can live in `static`/`const` items next to the
    /// plugin that owns them.
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _capability: PhantomData,
        }
    }

    /// Returns the reference id.
    pub const fn id(&self) -> &'static str {
        self.id
    }
}

// Manual impls: `T` itself need not be `Clone`/`Copy` for the handle to be.
impl<T: ?Sized> Clone for ServiceRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for ServiceRef<T> {}

impl<T: ?Sized> std::fmt::Debug for ServiceRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServiceRef").field(&self.id).finish()
    }
}

impl<T: ?Sized> std::fmt::Display for ServiceRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id)
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<ServiceRef<U>> for ServiceRef<T> {
    fn eq(&self, other: &ServiceRef<U>) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized> Eq for ServiceRef<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn test_reference_is_copy() {
        const R: ServiceRef<dyn Marker> = ServiceRef::new("test.marker");
        let a = R;
        let b = a;
        assert_eq!(a, b);
        assert_eq!(b.id(), "test.marker");
    }

    #[test]
    fn test_display_uses_id() {
        let r: ServiceRef<String> = ServiceRef::new("core.config");
        assert_eq!(r.to_string(), "core.config");
    }
}
