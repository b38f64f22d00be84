//! Plugin lifecycle orchestration.
//!
//! [`PluginManager`] is the central owner of all registered plugins and
//! modules.  It:
//!
//! - Accepts [`PluginDescriptor`]s and [`ModuleDescriptor`]s during the
//!   build phase, rejecting duplicate ids and modules whose parent plugin
//!   is not registered.
//! - Drives [`start`](PluginManager::start) in three ordered phases:
//!   registration callbacks (insertion order), topological ordering of
//!   initialization callbacks, then the callbacks themselves — each awaited
//!   to completion with its resolved dependency bundle, exactly once.
//! - Owns the [`ServiceRegistry`] and [`ExtensionPointRegistry`] shared by
//!   all units; hosts may define their own services (configuration, router
//!   handoff, persistence clients) before `start`.
//!
//! Startup is all-or-nothing: the first failing callback aborts `start`
//! with the originating unit id, and a failed manager is not restartable.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut manager = PluginManager::new();
//! manager.add_plugin(catalog_plugin())?;
//! manager.add_module(tagging_module())?;
//! manager.start().await?;
//! ```

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use tracing::{Instrument, debug, info, span, warn};

use trellis_core::ServiceRegistry;

use crate::context::{InitContext, RegistrationContext};
use crate::descriptor::{InitFn, ModuleDescriptor, PluginDescriptor, RegisterFn};
use crate::error::{ManagerError, ManagerResult};
use crate::extension::ExtensionPointRegistry;

// =============================================================================
// Units (internal)
// =============================================================================

enum UnitKind {
    Plugin,
    Module { parent: &'static str },
}

struct Unit {
    id: &'static str,
    kind: UnitKind,
    register: Option<RegisterFn>,
    init: Option<InitFn>,
    /// Declared service dependencies, collected during the build phase.
    depends_on: Vec<&'static str>,
    /// Extension points this unit will populate during init.
    extends: Vec<&'static str>,
    /// Service ids this unit's factories provide.
    provides: Vec<&'static str>,
}

impl Unit {
    fn kind_name(&self) -> &'static str {
        match self.kind {
            UnitKind::Plugin => "plugin",
            UnitKind::Module { .. } => "module",
        }
    }

    fn parent(&self) -> Option<&'static str> {
        match self.kind {
            UnitKind::Plugin => None,
            UnitKind::Module { parent } => Some(parent),
        }
    }
}

// =============================================================================
// Topological ordering
// =============================================================================

/// Computes the initialization order via Kahn's algorithm.
///
/// Dependency edges, both meaning "A initializes before B":
///
/// - **Service**: A provides a service B declared with `depend_on`.
/// - **Extension point**: B owns a point A declared with `extend`, so every
///   contribution is visible inside B's init callback.
///
/// Declared services no registered unit provides are assumed host-defined;
/// they get no edge and are checked when the consumer's bundle is resolved.
///
/// Ties are broken deterministically: among ready units the one registered
/// earliest initializes first.
///
/// # Errors
///
/// Returns [`ManagerError::DependencyCycle`] naming the blocked units when
/// no valid order exists.
fn topological_order(
    units: &[Unit],
    points: &ExtensionPointRegistry,
) -> ManagerResult<Vec<usize>> {
    let n = units.len();

    // Map: service id → index of the providing unit.  Uniqueness is already
    // enforced by ServiceRegistry::define during the build phase.
    let mut provider_map: HashMap<&str, usize> = HashMap::new();
    for (i, unit) in units.iter().enumerate() {
        for &service_id in &unit.provides {
            provider_map.insert(service_id, i);
        }
    }
    let index_of: HashMap<&str, usize> = units.iter().enumerate().map(|(i, u)| (u.id, i)).collect();

    let mut in_degree: Vec<usize> = vec![0; n];
    let mut dependents: Vec<Vec<usize>> = vec![vec![]; n];

    for (i, unit) in units.iter().enumerate() {
        for &dep_id in &unit.depends_on {
            match provider_map.get(dep_id) {
                Some(&provider) if provider != i => {
                    dependents[provider].push(i);
                    in_degree[i] += 1;
                }
                Some(_) => {
                    warn!(
                        unit = unit.id,
                        service = dep_id,
                        "Unit depends on a service it provides itself — edge ignored"
                    );
                }
                None => {
                    debug!(
                        unit = unit.id,
                        service = dep_id,
                        "No registered unit provides this service; assuming host-defined"
                    );
                }
            }
        }
        for &point_id in &unit.extends {
            // Targets are validated before ordering, so the owner exists.
            if let Some(owner) = points.owner(point_id)
                && let Some(&owner_idx) = index_of.get(owner)
                && owner_idx != i
            {
                dependents[i].push(owner_idx);
                in_degree[owner_idx] += 1;
            }
        }
    }

    // Kahn's algorithm; the frontier always yields the lowest registration
    // index first.
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);

    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &j in &dependents[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }

    if order.len() != n {
        let blocked: Vec<String> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| units[i].id.to_string())
            .collect();
        return Err(ManagerError::DependencyCycle { units: blocked });
    }

    Ok(order)
}

// =============================================================================
// PluginManager
// =============================================================================

/// Central manager for plugin/module registration and ordered startup.
///
/// The manager is handed explicitly into every callback through its
/// contexts; units never reach the registries through globals.
pub struct PluginManager {
    units: Vec<Unit>,
    services: ServiceRegistry,
    extension_points: Arc<ExtensionPointRegistry>,
    started: bool,
    /// Unit ids in the order they were (or would be) initialized.
    init_order: Vec<&'static str>,
}

impl PluginManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            services: ServiceRegistry::new(),
            extension_points: Arc::new(ExtensionPointRegistry::new()),
            started: false,
            init_order: Vec::new(),
        }
    }

    /// Shared view of the service registry.
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Mutable access to the service registry.
    ///
    /// Hosts use this before [`start`](Self::start) to define services the
    /// platform provides (the configuration accessor, a router handoff, a
    /// database client) so plugins can declare them like any other
    /// dependency.
    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// Shared view of the extension-point registry.
    pub fn extension_points(&self) -> &ExtensionPointRegistry {
        &self.extension_points
    }

    /// Number of enqueued plugins and modules.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` once [`start`](Self::start) has been entered.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Unit ids in initialization order; empty before a successful ordering.
    pub fn initialization_order(&self) -> &[&'static str] {
        &self.init_order
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Enqueues a plugin descriptor.
    ///
    /// Fails with [`ManagerError::DuplicateId`] if any unit already uses the
    /// id, leaving the manager unchanged.
    pub fn add_plugin(&mut self, descriptor: PluginDescriptor) -> ManagerResult<()> {
        self.ensure_not_started()?;
        self.ensure_unique(descriptor.id)?;
        info!(plugin = descriptor.id, "Plugin registered");
        self.units.push(Unit {
            id: descriptor.id,
            kind: UnitKind::Plugin,
            register: descriptor.register,
            init: descriptor.init,
            depends_on: Vec::new(),
            extends: Vec::new(),
            provides: Vec::new(),
        });
        Ok(())
    }

    /// Enqueues a module descriptor.
    ///
    /// The parent plugin must already be registered; otherwise fails with
    /// [`ManagerError::ModuleWithoutParent`].
    pub fn add_module(&mut self, descriptor: ModuleDescriptor) -> ManagerResult<()> {
        self.ensure_not_started()?;
        self.ensure_unique(descriptor.id)?;
        let parent_registered = self
            .units
            .iter()
            .any(|u| u.id == descriptor.parent && matches!(u.kind, UnitKind::Plugin));
        if !parent_registered {
            return Err(ManagerError::ModuleWithoutParent {
                module: descriptor.id,
                parent: descriptor.parent,
            });
        }
        info!(module = descriptor.id, parent = descriptor.parent, "Module registered");
        self.units.push(Unit {
            id: descriptor.id,
            kind: UnitKind::Module {
                parent: descriptor.parent,
            },
            register: descriptor.register,
            init: descriptor.init,
            depends_on: Vec::new(),
            extends: Vec::new(),
            provides: Vec::new(),
        });
        Ok(())
    }

    fn ensure_not_started(&self) -> ManagerResult<()> {
        if self.started {
            return Err(ManagerError::AlreadyStarted);
        }
        Ok(())
    }

    fn ensure_unique(&self, id: &'static str) -> ManagerResult<()> {
        if self.units.iter().any(|u| u.id == id) {
            return Err(ManagerError::DuplicateId { id });
        }
        Ok(())
    }

    // ─── Startup ─────────────────────────────────────────────────────────────

    /// Runs the three startup phases; all-or-nothing.
    ///
    /// 1. Every registration callback runs synchronously in insertion
    ///    order, declaring dependencies and registering extension points.
    /// 2. Initialization callbacks are topologically ordered: service
    ///    providers before consumers, extension-point contributors before
    ///    the point's owner; remaining ties broken by registration order.
    /// 3. Each init callback runs exactly once with its resolved bundle,
    ///    awaited to completion before the next begins.  A unit's own
    ///    extension points are frozen the moment its turn starts.
    ///
    /// The first error aborts startup and names the offending unit; a
    /// failed manager stays in the started state and cannot be reused.
    pub async fn start(&mut self) -> ManagerResult<()> {
        self.ensure_not_started()?;
        self.started = true;

        self.run_registration_phase()?;
        self.validate_extension_targets()?;

        let order = topological_order(&self.units, &self.extension_points)?;
        self.init_order = order.iter().map(|&i| self.units[i].id).collect();
        debug!(order = ?self.init_order, "Initialization order computed");

        self.run_init_phase(&order).await?;

        info!(units = self.units.len(), "Composition started");
        Ok(())
    }

    fn run_registration_phase(&mut self) -> ManagerResult<()> {
        for idx in 0..self.units.len() {
            let id = self.units[idx].id;
            let kind = self.units[idx].kind_name();
            let Some(register) = self.units[idx].register.take() else {
                continue;
            };

            let registration_span = span!(tracing::Level::DEBUG, "register", unit = %id);
            let _enter = registration_span.enter();

            let mut ctx = RegistrationContext::new(id, &mut self.services, &self.extension_points);
            register(&mut ctx).map_err(|source| ManagerError::Registration { unit: id, source })?;

            let declarations = ctx.into_declarations();
            debug!(
                unit = %id,
                kind,
                parent = self.units[idx].parent(),
                depends_on = ?declarations.depends_on,
                extends = ?declarations.extends,
                provides = ?declarations.provides,
                "Registration complete"
            );
            let unit = &mut self.units[idx];
            unit.depends_on = declarations.depends_on;
            unit.extends = declarations.extends;
            unit.provides = declarations.provides;
        }
        Ok(())
    }

    fn validate_extension_targets(&self) -> ManagerResult<()> {
        for unit in &self.units {
            for &point in &unit.extends {
                if !self.extension_points.contains(point) {
                    return Err(ManagerError::UnknownExtensionPoint {
                        unit: unit.id,
                        point,
                    });
                }
            }
        }
        Ok(())
    }

    async fn run_init_phase(&mut self, order: &[usize]) -> ManagerResult<()> {
        for &idx in order {
            let id = self.units[idx].id;

            // This unit's turn: every contributor has already run, so its
            // own points are complete. Freeze them before the callback can
            // observe them.
            self.extension_points.freeze_owned_by(id);

            let Some(init) = self.units[idx].init.take() else {
                continue;
            };
            let depends_on = self.units[idx].depends_on.clone();
            let bundle = self
                .services
                .resolve_bundle(&depends_on)
                .await
                .map_err(|source| ManagerError::Service { unit: id, source })?;

            let ctx = InitContext::new(id, bundle, Arc::clone(&self.extension_points));
            let init_span = span!(tracing::Level::INFO, "init", unit = %id);
            init(ctx)
                .instrument(init_span)
                .await
                .map_err(|source| ManagerError::Initialization { unit: id, source })?;
            info!(unit = %id, "Initialized");
        }
        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("units", &self.units.iter().map(|u| u.id).collect::<Vec<_>>())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use trellis_core::{ServiceError, ServiceFactory, ServiceRef};

    use crate::extension::ExtensionPoint;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn logging_plugin(id: &'static str, log: &Log) -> PluginDescriptor {
        let log = Arc::clone(log);
        PluginDescriptor::new(id).on_init(move |_ctx| async move {
            log.lock().push(id);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_duplicate_plugin_id_leaves_state_unchanged() {
        let mut manager = PluginManager::new();
        manager.add_plugin(PluginDescriptor::new("scaffolder")).unwrap();
        let err = manager
            .add_plugin(PluginDescriptor::new("scaffolder"))
            .unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateId { id: "scaffolder" }));
        assert_eq!(manager.unit_count(), 1);
    }

    #[tokio::test]
    async fn test_module_requires_registered_parent() {
        let mut manager = PluginManager::new();
        let err = manager
            .add_module(ModuleDescriptor::new("m1", "catalog"))
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::ModuleWithoutParent {
                module: "m1",
                parent: "catalog"
            }
        ));
        assert_eq!(manager.unit_count(), 0);

        manager.add_plugin(PluginDescriptor::new("catalog")).unwrap();
        manager.add_module(ModuleDescriptor::new("m1", "catalog")).unwrap();
        assert_eq!(manager.unit_count(), 2);
    }

    #[tokio::test]
    async fn test_module_id_cannot_shadow_plugin_id() {
        let mut manager = PluginManager::new();
        manager.add_plugin(PluginDescriptor::new("catalog")).unwrap();
        let err = manager
            .add_module(ModuleDescriptor::new("catalog", "catalog"))
            .unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateId { id: "catalog" }));
    }

    #[tokio::test]
    async fn test_no_descriptors_after_start() {
        let mut manager = PluginManager::new();
        manager.add_plugin(PluginDescriptor::new("first")).unwrap();
        manager.start().await.unwrap();

        assert!(matches!(
            manager.add_plugin(PluginDescriptor::new("late")),
            Err(ManagerError::AlreadyStarted)
        ));
        assert!(matches!(
            manager.start().await,
            Err(ManagerError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_independent_plugins_init_in_registration_order() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = PluginManager::new();
        manager.add_plugin(logging_plugin("alpha", &log)).unwrap();
        manager.add_plugin(logging_plugin("beta", &log)).unwrap();
        manager.add_plugin(logging_plugin("gamma", &log)).unwrap();
        manager.start().await.unwrap();

        assert_eq!(*log.lock(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(manager.initialization_order(), ["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_service_provider_initializes_before_consumer() {
        const STORE: ServiceRef<String> = ServiceRef::new("db.store");

        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let consumer_log = Arc::clone(&log);
        let provider_log = Arc::clone(&log);

        let mut manager = PluginManager::new();
        // Consumer registered first; the service edge must still order it
        // after the provider.
        manager
            .add_plugin(
                PluginDescriptor::new("app")
                    .on_register(|ctx| {
                        ctx.depend_on(STORE);
                        Ok(())
                    })
                    .on_init(move |ctx| async move {
                        let store = ctx.service(STORE)?;
                        assert_eq!(*store, "connected");
                        consumer_log.lock().push("app");
                        Ok(())
                    }),
            )
            .unwrap();
        manager
            .add_plugin(
                PluginDescriptor::new("db")
                    .on_register(|ctx| {
                        ctx.provide(
                            STORE,
                            ServiceFactory::new(|_| async { Ok(Arc::new("connected".to_string())) }),
                        )?;
                        Ok(())
                    })
                    .on_init(move |_ctx| async move {
                        provider_log.lock().push("db");
                        Ok(())
                    }),
            )
            .unwrap();

        manager.start().await.unwrap();
        assert_eq!(*log.lock(), vec!["db", "app"]);
    }

    #[derive(Default)]
    struct Processing {
        processors: Vec<&'static str>,
    }

    const PROCESSING: ExtensionPoint<Processing> = ExtensionPoint::new("catalog.processing");

    #[tokio::test]
    async fn test_module_contribution_visible_in_owner_init() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_catalog = Arc::clone(&seen);

        let mut manager = PluginManager::new();
        manager
            .add_plugin(
                PluginDescriptor::new("catalog")
                    .on_register(|ctx| {
                        ctx.register_extension_point(PROCESSING, Processing::default())?;
                        Ok(())
                    })
                    .on_init(move |ctx| async move {
                        let processors =
                            ctx.with_extension_point(PROCESSING, |p| p.processors.clone())?;
                        *seen_in_catalog.lock() = processors;
                        Ok(())
                    }),
            )
            .unwrap();
        manager
            .add_module(
                ModuleDescriptor::new("m1", "catalog")
                    .on_register(|ctx| {
                        ctx.extend(PROCESSING);
                        Ok(())
                    })
                    .on_init(|ctx| async move {
                        ctx.with_extension_point_mut(PROCESSING, |p| p.processors.push("p1"))?;
                        Ok(())
                    }),
            )
            .unwrap();

        manager.start().await.unwrap();

        assert_eq!(*seen.lock(), vec!["p1"]);
        assert_eq!(manager.initialization_order(), ["m1", "catalog"]);

        // Contribution window is closed after the owner initialized.
        assert!(matches!(
            manager
                .extension_points()
                .with_mut(PROCESSING, |p| p.processors.push("late")),
            Err(crate::error::ExtensionError::ExtensionPointFrozen { .. })
        ));
    }

    #[tokio::test]
    async fn test_points_freeze_at_owner_turn_even_without_init() {
        let saw_frozen = Arc::new(Mutex::new(false));
        let saw_frozen_in_init = Arc::clone(&saw_frozen);

        let mut manager = PluginManager::new();
        // Owner registers the point but has no init callback; its points
        // must still freeze when its turn comes around.
        manager
            .add_plugin(PluginDescriptor::new("owner").on_register(|ctx| {
                ctx.register_extension_point(PROCESSING, Processing::default())?;
                Ok(())
            }))
            .unwrap();
        manager
            .add_plugin(
                PluginDescriptor::new("later").on_init(move |ctx| async move {
                    *saw_frozen_in_init.lock() = ctx
                        .with_extension_point_mut(PROCESSING, |_| ())
                        .is_err();
                    Ok(())
                }),
            )
            .unwrap();

        manager.start().await.unwrap();

        assert!(*saw_frozen.lock());
        assert!(manager.extension_points().is_frozen("catalog.processing"));
    }

    #[tokio::test]
    async fn test_extending_unknown_point_fails_startup() {
        let mut manager = PluginManager::new();
        manager.add_plugin(PluginDescriptor::new("catalog")).unwrap();
        manager
            .add_module(ModuleDescriptor::new("m1", "catalog").on_register(|ctx| {
                ctx.extend(PROCESSING);
                Ok(())
            }))
            .unwrap();

        assert!(matches!(
            manager.start().await,
            Err(ManagerError::UnknownExtensionPoint {
                unit: "m1",
                point: "catalog.processing"
            })
        ));
    }

    #[tokio::test]
    async fn test_init_failure_aborts_startup_with_unit_id() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = PluginManager::new();
        manager.add_plugin(logging_plugin("first", &log)).unwrap();
        manager
            .add_plugin(
                PluginDescriptor::new("boom")
                    .on_init(|_ctx| async { Err("database unreachable".to_string().into()) }),
            )
            .unwrap();
        manager.add_plugin(logging_plugin("never", &log)).unwrap();

        match manager.start().await {
            Err(ManagerError::Initialization { unit: "boom", source }) => {
                assert_eq!(source.to_string(), "database unreachable");
            }
            other => panic!("expected initialization error, got {other:?}"),
        }
        // Units after the failure never ran.
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_cyclic_service_dependencies_fail_ordering() {
        const LEFT: ServiceRef<u8> = ServiceRef::new("left.service");
        const RIGHT: ServiceRef<u8> = ServiceRef::new("right.service");

        let mut manager = PluginManager::new();
        manager
            .add_plugin(PluginDescriptor::new("left").on_register(|ctx| {
                ctx.provide(LEFT, ServiceFactory::new(|_| async { Ok(Arc::new(0)) }))?;
                ctx.depend_on(RIGHT);
                Ok(())
            }))
            .unwrap();
        manager
            .add_plugin(PluginDescriptor::new("right").on_register(|ctx| {
                ctx.provide(RIGHT, ServiceFactory::new(|_| async { Ok(Arc::new(0)) }))?;
                ctx.depend_on(LEFT);
                Ok(())
            }))
            .unwrap();

        match manager.start().await {
            Err(ManagerError::DependencyCycle { units }) => {
                assert_eq!(units, vec!["left".to_string(), "right".to_string()]);
            }
            other => panic!("expected dependency cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_service_definition_fails_registration() {
        const STORE: ServiceRef<String> = ServiceRef::new("db.store");

        let mut manager = PluginManager::new();
        for id in ["one", "two"] {
            manager
                .add_plugin(PluginDescriptor::new(id).on_register(|ctx| {
                    ctx.provide(
                        STORE,
                        ServiceFactory::new(|_| async { Ok(Arc::new(String::new())) }),
                    )?;
                    Ok(())
                }))
                .unwrap();
        }

        match manager.start().await {
            Err(ManagerError::Registration { unit: "two", source }) => {
                let service_err = source.downcast_ref::<ServiceError>().unwrap();
                assert!(matches!(
                    service_err,
                    ServiceError::DuplicateService { id: "db.store" }
                ));
            }
            other => panic!("expected registration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_host_defined_services_resolve_without_provider_unit() {
        const CONFIG: ServiceRef<String> = ServiceRef::new("host.config");

        let mut manager = PluginManager::new();
        manager
            .services_mut()
            .define(
                CONFIG,
                ServiceFactory::instance(Arc::new("from-host".to_string())),
            )
            .unwrap();

        let observed = Arc::new(Mutex::new(String::new()));
        let observed_in_init = Arc::clone(&observed);
        manager
            .add_plugin(
                PluginDescriptor::new("app")
                    .on_register(|ctx| {
                        ctx.depend_on(CONFIG);
                        Ok(())
                    })
                    .on_init(move |ctx| async move {
                        *observed_in_init.lock() = ctx.service(CONFIG)?.to_string();
                        Ok(())
                    }),
            )
            .unwrap();

        manager.start().await.unwrap();
        assert_eq!(*observed.lock(), "from-host");
    }

    #[tokio::test]
    async fn test_each_init_runs_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_in_init = Arc::clone(&count);

        let mut manager = PluginManager::new();
        manager
            .add_plugin(PluginDescriptor::new("once").on_init(move |_| {
                let count = Arc::clone(&count_in_init);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }))
            .unwrap();

        manager.start().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
