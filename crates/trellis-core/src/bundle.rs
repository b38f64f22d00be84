//! [`ServiceBundle`] — the resolved dependencies handed to a factory or an
//! initialization callback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::factory::ServiceArc;
use crate::reference::ServiceRef;

/// A read-only snapshot of resolved services, keyed by reference id.
///
/// A bundle contains exactly the services its owner declared; asking for an
/// undeclared reference fails with
/// [`UnresolvedService`](ServiceError::UnresolvedService) even when the
/// registry could have resolved it.  This keeps every dependency visible in
/// the declaration rather than discovered at runtime.
#[derive(Clone, Default)]
pub struct ServiceBundle {
    services: HashMap<&'static str, ServiceArc>,
}

impl ServiceBundle {
    pub(crate) fn new(services: HashMap<&'static str, ServiceArc>) -> Self {
        Self { services }
    }

    /// Returns the resolved instance for a declared reference.
    pub fn get<T: ?Sized + Send + Sync + 'static>(
        &self,
        service: ServiceRef<T>,
    ) -> ServiceResult<Arc<T>> {
        let erased = self
            .services
            .get(service.id())
            .ok_or(ServiceError::UnresolvedService { id: service.id() })?;
        erased
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ServiceError::ServiceTypeMismatch { id: service.id() })
    }

    /// Returns `true` if the bundle contains the given reference id.
    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Number of services in the bundle.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if the bundle is empty.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBundle")
            .field("ids", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBER: ServiceRef<u32> = ServiceRef::new("test.number");
    const MISSING: ServiceRef<u32> = ServiceRef::new("test.missing");
    const WRONG: ServiceRef<String> = ServiceRef::new("test.number");

    fn bundle_with_number() -> ServiceBundle {
        let mut services: HashMap<&'static str, ServiceArc> = HashMap::new();
        let instance: Arc<u32> = Arc::new(7);
        services.insert("test.number", Arc::new(instance) as ServiceArc);
        ServiceBundle::new(services)
    }

    #[test]
    fn test_get_declared_service() {
        let bundle = bundle_with_number();
        assert_eq!(*bundle.get(NUMBER).unwrap(), 7);
    }

    #[test]
    fn test_get_undeclared_service_fails() {
        let bundle = bundle_with_number();
        assert!(matches!(
            bundle.get(MISSING),
            Err(ServiceError::UnresolvedService { id: "test.missing" })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let bundle = bundle_with_number();
        assert!(matches!(
            bundle.get(WRONG),
            Err(ServiceError::ServiceTypeMismatch { id: "test.number" })
        ));
    }
}
