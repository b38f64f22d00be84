//! [`ServiceFactory`] — binds a reference to a construction function and its
//! declared dependencies.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::bundle::ServiceBundle;
use crate::error::BoxError;
use crate::reference::ServiceRef;

/// Erased singleton as stored in the registry.
///
/// The inner `dyn Any` is an `Arc<T>` boxed behind a second `Arc`, so the
/// registry can hold services of heterogeneous types (including `dyn Trait`
/// objects) in one map.  Consumers downcast back to `Arc<T>` through
/// [`ServiceBundle::get`](crate::ServiceBundle::get) or
/// [`ServiceRegistry::resolve`](crate::ServiceRegistry::resolve).
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Erased construction function stored in the registry.
pub(crate) type ConstructFn =
    Box<dyn Fn(ServiceBundle) -> BoxFuture<'static, Result<ServiceArc, BoxError>> + Send + Sync>;

/// An async construction recipe for a service of type `T`.
///
/// A factory bundles the construction function with the list of service
/// references it needs resolved first.  The registry invokes the function at
/// most once (on first resolution) and passes it a [`ServiceBundle`]
/// containing exactly the declared dependencies.
///
/// # Example
///
/// ```rust,ignore
/// let factory = ServiceFactory::new(|deps| async move {
///     let config = deps.get(CONFIG_SERVICE)?;
///     Ok(Arc::new(SqlCatalogStore::connect(&config).await?) as Arc<dyn CatalogStore>)
/// })
/// .depends_on(CONFIG_SERVICE);
///
/// registry.define(CATALOG_STORE, factory)?;
/// ```
pub struct ServiceFactory<T: ?Sized> {
    pub(crate) depends_on: Vec<&'static str>,
    pub(crate) construct: ConstructFn,
    _produces: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Send + Sync + 'static> ServiceFactory<T> {
    /// Creates a factory from an async construction function.
    ///
    /// The function receives the resolved dependency bundle and returns the
    /// singleton instance.  Construction may perform I/O; it is awaited to
    /// completion before any dependent service is built.
    pub fn new<F, Fut>(construct: F) -> Self
    where
        F: Fn(ServiceBundle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, BoxError>> + Send + 'static,
    {
        Self {
            depends_on: Vec::new(),
            construct: Box::new(move |deps| {
                let fut = construct(deps);
                Box::pin(async move { fut.await.map(|arc| Arc::new(arc) as ServiceArc) })
            }),
            _produces: PhantomData,
        }
    }

    /// Creates a factory that hands out an already-built instance.
    ///
    /// Used for host-provided services (the configuration accessor, for
    /// example) that exist before the registry starts resolving.
    pub fn instance(instance: Arc<T>) -> Self {
        Self::new(move |_deps| {
            let instance = Arc::clone(&instance);
            async move { Ok(instance) }
        })
    }

    /// Declares a dependency resolved before this factory runs.
    ///
    /// The dependency graph formed by all registered factories must be
    /// acyclic; a cycle is reported at resolution time.
    pub fn depends_on<U: ?Sized>(mut self, service: ServiceRef<U>) -> Self {
        self.depends_on.push(service.id());
        self
    }
}

impl<T: ?Sized> std::fmt::Debug for ServiceFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory")
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
