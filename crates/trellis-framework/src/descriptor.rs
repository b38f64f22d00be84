//! Plugin and module descriptors — the declarative units the manager
//! orchestrates.
//!
//! A descriptor bundles an identifier with up to two callbacks:
//!
//! - **register** runs synchronously during the build phase.  It declares
//!   the unit's service and extension-point dependencies, defines service
//!   factories, and registers extension points.
//! - **init** runs asynchronously after every declared dependency is
//!   resolved, exactly once, in dependency order.
//!
//! Modules additionally name the plugin they extend; they have no identity
//! outside that parent.
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = PluginDescriptor::new("catalog")
//!     .on_register(|ctx| {
//!         ctx.register_extension_point(CATALOG_PROCESSING, CatalogProcessing::default())?;
//!         ctx.provide(CATALOG_STORE, ServiceFactory::new(|_| async {
//!             Ok(Arc::new(InMemoryStore::default()) as Arc<dyn CatalogStore>)
//!         }))?;
//!         Ok(())
//!     })
//!     .on_init(|ctx| async move {
//!         let count = ctx.with_extension_point(CATALOG_PROCESSING, |p| p.len())?;
//!         tracing::info!(processors = count, "Catalog pipeline assembled");
//!         Ok(())
//!     });
//! ```

use std::future::Future;

use futures::future::BoxFuture;

use trellis_core::BoxError;

use crate::context::{InitContext, RegistrationContext};

/// Type of the boxed registration callback stored in a descriptor.
pub(crate) type RegisterFn =
    Box<dyn FnOnce(&mut RegistrationContext<'_>) -> Result<(), BoxError> + Send>;

/// Type of the boxed initialization callback stored in a descriptor.
pub(crate) type InitFn =
    Box<dyn FnOnce(InitContext) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// Describes a top-level plugin.
pub struct PluginDescriptor {
    pub(crate) id: &'static str,
    pub(crate) register: Option<RegisterFn>,
    pub(crate) init: Option<InitFn>,
}

impl PluginDescriptor {
    /// Creates a descriptor with no callbacks.
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            register: None,
            init: None,
        }
    }

    /// Returns the plugin id.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Sets the registration callback.
    pub fn on_register<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut RegistrationContext<'_>) -> Result<(), BoxError> + Send + 'static,
    {
        self.register = Some(Box::new(register));
        self
    }

    /// Sets the initialization callback.
    pub fn on_init<F, Fut>(mut self, init: F) -> Self
    where
        F: FnOnce(InitContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.init = Some(Box::new(move |ctx| Box::pin(init(ctx))));
        self
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("has_register", &self.register.is_some())
            .field("has_init", &self.init.is_some())
            .finish()
    }
}

/// Describes a module extending one parent plugin.
///
/// A module's registration callback typically calls
/// [`extend`](crate::context::RegistrationContext::extend) for the parent's
/// extension point(s); its init callback then populates them via
/// [`with_extension_point_mut`](InitContext::with_extension_point_mut).
/// The manager guarantees the module initializes before the owner of every
/// point it extends.
pub struct ModuleDescriptor {
    pub(crate) id: &'static str,
    pub(crate) parent: &'static str,
    pub(crate) register: Option<RegisterFn>,
    pub(crate) init: Option<InitFn>,
}

impl ModuleDescriptor {
    /// Creates a descriptor for a module extending `parent`.
    pub fn new(id: &'static str, parent: &'static str) -> Self {
        Self {
            id,
            parent,
            register: None,
            init: None,
        }
    }

    /// Returns the module id.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the parent plugin id.
    pub fn parent(&self) -> &'static str {
        self.parent
    }

    /// Sets the registration callback.
    pub fn on_register<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut RegistrationContext<'_>) -> Result<(), BoxError> + Send + 'static,
    {
        self.register = Some(Box::new(register));
        self
    }

    /// Sets the initialization callback.
    pub fn on_init<F, Fut>(mut self, init: F) -> Self
    where
        F: FnOnce(InitContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.init = Some(Box::new(move |ctx| Box::pin(init(ctx))));
        self
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .finish()
    }
}
