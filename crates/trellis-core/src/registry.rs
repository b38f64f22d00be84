//! [`ServiceRegistry`] — factory storage and memoized dependency resolution.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::bundle::ServiceBundle;
use crate::error::{ServiceError, ServiceResult};
use crate::factory::{ConstructFn, ServiceArc, ServiceFactory};
use crate::reference::ServiceRef;

struct FactoryEntry {
    depends_on: Vec<&'static str>,
    construct: ConstructFn,
}

/// A construction in progress, shared by every resolver waiting on it.
type InFlight = Shared<BoxFuture<'static, ServiceResult<ServiceArc>>>;

/// State shared between the registry and its in-flight construction futures.
#[derive(Default)]
struct RegistryShared {
    factories: RwLock<HashMap<&'static str, FactoryEntry>>,
    instances: Mutex<HashMap<&'static str, ServiceArc>>,
    in_flight: Mutex<HashMap<&'static str, InFlight>>,
}

/// Holds service factories and the singletons they produce.
///
/// Factories are defined during the build phase via [`define`](Self::define);
/// instances are constructed lazily on first [`resolve`](Self::resolve),
/// depth-first over each factory's declared dependencies, and memoized so
/// every service is built at most once.
///
/// # Resolution semantics
///
/// - A reference with no factory fails with
///   [`UnresolvedService`](ServiceError::UnresolvedService).
/// - A reference revisited on the current resolution path fails with
///   [`CyclicDependency`](ServiceError::CyclicDependency); nothing from the
///   failed path is cached.  The path is carried per call, so independent
///   resolutions never observe each other's frames.
/// - A factory error is surfaced as
///   [`Construction`](ServiceError::Construction) with the service id.
///
/// Concurrent resolvers of the same uncached service share one in-flight
/// construction: the first caller runs the factory, the rest await the same
/// future, and all receive the same singleton.
#[derive(Default)]
pub struct ServiceRegistry {
    shared: Arc<RegistryShared>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a factory to a reference.
    ///
    /// Fails with [`DuplicateService`](ServiceError::DuplicateService) if a
    /// factory is already bound to the same id; the first binding is
    /// unaffected.
    pub fn define<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        service: ServiceRef<T>,
        factory: ServiceFactory<T>,
    ) -> ServiceResult<()> {
        let id = service.id();
        let mut factories = self.shared.factories.write();
        if factories.contains_key(id) {
            return Err(ServiceError::DuplicateService { id });
        }
        debug!(service = id, deps = ?factory.depends_on, "Service factory defined");
        factories.insert(
            id,
            FactoryEntry {
                depends_on: factory.depends_on,
                construct: factory.construct,
            },
        );
        Ok(())
    }

    /// Returns `true` if a factory is bound to the given id.
    pub fn is_defined(&self, id: &str) -> bool {
        self.shared.factories.read().contains_key(id)
    }

    /// Returns `true` if the service has already been constructed.
    pub fn has_instance(&self, id: &str) -> bool {
        self.shared.instances.lock().contains_key(id)
    }

    /// Number of constructed singletons.
    pub fn instance_count(&self) -> usize {
        self.shared.instances.lock().len()
    }

    /// Resolves the singleton for a reference, constructing it (and its
    /// dependencies, depth-first) on first access.
    pub async fn resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
        service: ServiceRef<T>,
    ) -> ServiceResult<Arc<T>> {
        let erased = resolve_erased(Arc::clone(&self.shared), service.id(), Vec::new()).await?;
        erased
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ServiceError::ServiceTypeMismatch { id: service.id() })
    }

    /// Resolves every id in `ids` and packs the results into a bundle.
    ///
    /// This is how the plugin manager materializes the declared dependencies
    /// of a unit before invoking its initialization callback.
    pub async fn resolve_bundle(&self, ids: &[&'static str]) -> ServiceResult<ServiceBundle> {
        let mut services = HashMap::with_capacity(ids.len());
        for &id in ids {
            let erased = resolve_erased(Arc::clone(&self.shared), id, Vec::new()).await?;
            services.insert(id, erased);
        }
        Ok(ServiceBundle::new(services))
    }
}

/// Resolves one id: cache, then cycle check against this call's own path,
/// then join or start the in-flight construction.
///
/// The path check must come before the in-flight lookup: a cyclic graph
/// revisits an id whose construction this very call started, and joining
/// that future would wait on itself.
fn resolve_erased(
    shared: Arc<RegistryShared>,
    id: &'static str,
    path: Vec<&'static str>,
) -> BoxFuture<'static, ServiceResult<ServiceArc>> {
    Box::pin(async move {
        let cached = shared.instances.lock().get(id).cloned();
        if let Some(instance) = cached {
            trace!(service = id, "Resolved from cache");
            return Ok(instance);
        }

        if path.contains(&id) {
            let mut cycle = path;
            cycle.push(id);
            return Err(ServiceError::CyclicDependency { path: cycle });
        }

        let construction = {
            let mut in_flight = shared.in_flight.lock();
            match in_flight.get(id) {
                Some(existing) => existing.clone(),
                None => {
                    if !shared.factories.read().contains_key(id) {
                        return Err(ServiceError::UnresolvedService { id });
                    }
                    let fut = construct(Arc::clone(&shared), id, path).boxed().shared();
                    in_flight.insert(id, fut.clone());
                    fut
                }
            }
        };

        let result = construction.await;
        shared.in_flight.lock().remove(id);
        result
    })
}

async fn construct(
    shared: Arc<RegistryShared>,
    id: &'static str,
    mut path: Vec<&'static str>,
) -> ServiceResult<ServiceArc> {
    path.push(id);

    let depends_on = shared
        .factories
        .read()
        .get(id)
        .map(|entry| entry.depends_on.clone())
        .ok_or(ServiceError::UnresolvedService { id })?;

    let mut services = HashMap::with_capacity(depends_on.len());
    for dep in depends_on {
        let erased = resolve_erased(Arc::clone(&shared), dep, path.clone()).await?;
        services.insert(dep, erased);
    }

    // Take the factory future while holding the lock, await it after.
    let factory_fut = {
        let factories = shared.factories.read();
        let entry = factories
            .get(id)
            .ok_or(ServiceError::UnresolvedService { id })?;
        (entry.construct)(ServiceBundle::new(services))
    };
    let instance = factory_fut
        .await
        .map_err(|source| ServiceError::Construction {
            id,
            source: source.into(),
        })?;

    shared.instances.lock().insert(id, Arc::clone(&instance));
    debug!(service = id, "Service constructed");
    Ok(instance)
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field(
                "factories",
                &self.shared.factories.read().keys().collect::<Vec<_>>(),
            )
            .field("instances", &self.instance_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const A: ServiceRef<&'static str> = ServiceRef::new("a");
    const B: ServiceRef<String> = ServiceRef::new("b");

    #[tokio::test]
    async fn test_resolve_constructs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_factory = Arc::clone(&calls);

        let mut registry = ServiceRegistry::new();
        registry
            .define(
                A,
                ServiceFactory::new(move |_| {
                    calls_in_factory.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Arc::new("instance")) }
                }),
            )
            .unwrap();

        assert_eq!(*registry.resolve(A).await.unwrap(), "instance");
        assert_eq!(*registry.resolve(A).await.unwrap(), "instance");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_factory = Arc::clone(&calls);

        let mut registry = ServiceRegistry::new();
        registry
            .define(
                B,
                ServiceFactory::new(move |_| {
                    calls_in_factory.fetch_add(1, Ordering::SeqCst);
                    async {
                        // Keep the construction pending across several polls
                        // so the second resolver arrives mid-flight.
                        for _ in 0..4 {
                            tokio::task::yield_now().await;
                        }
                        Ok(Arc::new("singleton".to_string()))
                    }
                }),
            )
            .unwrap();

        let (first, second) = tokio::join!(registry.resolve(B), registry.resolve(B));
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_of_distinct_services() {
        const X: ServiceRef<u32> = ServiceRef::new("x");
        const Y: ServiceRef<u32> = ServiceRef::new("y");

        let mut registry = ServiceRegistry::new();
        for (service, value) in [(X, 1), (Y, 2)] {
            registry
                .define(
                    service,
                    ServiceFactory::new(move |_| async move {
                        tokio::task::yield_now().await;
                        Ok(Arc::new(value))
                    }),
                )
                .unwrap();
        }

        // Two acyclic resolutions running at once must not see each other's
        // paths as a cycle.
        let (x, y) = tokio::join!(registry.resolve(X), registry.resolve(Y));
        assert_eq!(*x.unwrap(), 1);
        assert_eq!(*y.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dependencies_resolved_first() {
        let mut registry = ServiceRegistry::new();
        registry
            .define(A, ServiceFactory::new(|_| async { Ok(Arc::new("base")) }))
            .unwrap();
        registry
            .define(
                B,
                ServiceFactory::new(|deps: ServiceBundle| async move {
                    let a = deps.get(A)?;
                    Ok(Arc::new(format!("{a}+derived")))
                })
                .depends_on(A),
            )
            .unwrap();

        assert_eq!(*registry.resolve(B).await.unwrap(), "base+derived");
        assert!(registry.has_instance("a"));
    }

    #[tokio::test]
    async fn test_duplicate_define_keeps_first() {
        let mut registry = ServiceRegistry::new();
        registry
            .define(A, ServiceFactory::new(|_| async { Ok(Arc::new("first")) }))
            .unwrap();
        let err = registry
            .define(A, ServiceFactory::new(|_| async { Ok(Arc::new("second")) }))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateService { id: "a" }));
        assert_eq!(*registry.resolve(A).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_unresolved_service() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.resolve(A).await,
            Err(ServiceError::UnresolvedService { id: "a" })
        ));
    }

    #[tokio::test]
    async fn test_cycle_detected_and_nothing_cached() {
        const X: ServiceRef<u32> = ServiceRef::new("x");
        const Y: ServiceRef<u32> = ServiceRef::new("y");

        let mut registry = ServiceRegistry::new();
        registry
            .define(
                X,
                ServiceFactory::new(|deps: ServiceBundle| async move {
                    Ok(Arc::new(*deps.get(Y)? + 1))
                })
                .depends_on(Y),
            )
            .unwrap();
        registry
            .define(
                Y,
                ServiceFactory::new(|deps: ServiceBundle| async move {
                    Ok(Arc::new(*deps.get(X)? + 1))
                })
                .depends_on(X),
            )
            .unwrap();

        match registry.resolve(X).await {
            Err(ServiceError::CyclicDependency { path }) => {
                assert_eq!(path, vec!["x", "y", "x"]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
        assert_eq!(registry.instance_count(), 0);

        // The failed attempt must not poison later resolution attempts.
        assert!(matches!(
            registry.resolve(Y).await,
            Err(ServiceError::CyclicDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_factory_failure_is_wrapped_and_not_cached() {
        let mut registry = ServiceRegistry::new();
        registry
            .define(
                A,
                ServiceFactory::new(|_| async { Err("boom".to_string().into()) }),
            )
            .unwrap();

        match registry.resolve(A).await {
            Err(ServiceError::Construction { id: "a", source }) => {
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("expected construction error, got {other:?}"),
        }
        assert!(!registry.has_instance("a"));
    }

    #[tokio::test]
    async fn test_resolve_bundle_contains_only_requested() {
        let mut registry = ServiceRegistry::new();
        registry
            .define(A, ServiceFactory::new(|_| async { Ok(Arc::new("base")) }))
            .unwrap();
        registry
            .define(
                B,
                ServiceFactory::new(|_| async { Ok(Arc::new("other".to_string())) }),
            )
            .unwrap();

        let bundle = registry.resolve_bundle(&["a"]).await.unwrap();
        assert!(bundle.contains("a"));
        assert!(!bundle.contains("b"));
        assert!(bundle.get(B).is_err());
    }

    #[tokio::test]
    async fn test_instance_factory() {
        let prebuilt = Arc::new("host".to_string());
        let mut registry = ServiceRegistry::new();
        registry
            .define(B, ServiceFactory::instance(Arc::clone(&prebuilt)))
            .unwrap();
        let resolved = registry.resolve(B).await.unwrap();
        assert!(Arc::ptr_eq(&resolved, &prebuilt));
    }
}
