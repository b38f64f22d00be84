//! Product Catalog Example
//!
//! A small composition demonstrating the three Trellis building blocks:
//!
//! - The **catalog** plugin provides a store service and owns the
//!   `catalog.processing` extension point.
//! - The **tagging** module (a child of catalog) contributes a processor to
//!   that pipeline without catalog knowing it exists.
//! - The **storefront** plugin depends on the store service and reads its
//!   own configuration section through the runtime's config service.
//!
//! The manager works out the right startup order on its own: tagging
//! initializes before catalog (so its processor is in the pipeline when
//! catalog assembles it), and catalog before storefront (which consumes the
//! store service).
//!
//! # Usage
//!
//! ```bash
//! cargo run --package catalog-demo
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::info;
use trellis::prelude::*;

// ============================================================================
// Catalog contracts
// ============================================================================

/// An item passing through the catalog pipeline.
#[derive(Debug, Clone)]
struct Item {
    name: String,
    tags: Vec<String>,
}

/// A processing step applied to every item entering the catalog.
trait ItemProcessor: Send + Sync {
    fn process(&self, item: &mut Item);
}

/// The pipeline modules populate during startup.
#[derive(Default)]
struct CatalogProcessing {
    processors: Vec<Box<dyn ItemProcessor>>,
}

impl CatalogProcessing {
    fn add_processor(&mut self, processor: impl ItemProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }
}

/// In-memory item store shared as a service.
#[derive(Default)]
struct CatalogStore {
    items: RwLock<Vec<Item>>,
}

impl CatalogStore {
    fn insert(&self, item: Item) {
        self.items.write().push(item);
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }
}

const CATALOG_STORE: ServiceRef<CatalogStore> = ServiceRef::new("catalog.store");
const CATALOG_PROCESSING: ExtensionPoint<CatalogProcessing> =
    ExtensionPoint::new("catalog.processing");

// ============================================================================
// Plugins and modules
// ============================================================================

fn catalog_plugin() -> PluginDescriptor {
    PluginDescriptor::new("catalog")
        .on_register(|ctx| {
            ctx.register_extension_point(CATALOG_PROCESSING, CatalogProcessing::default())?;
            ctx.provide(
                CATALOG_STORE,
                ServiceFactory::new(|_| async { Ok(Arc::new(CatalogStore::default())) }),
            )?;
            Ok(())
        })
        .on_init(|ctx| async move {
            let processors = ctx.with_extension_point(CATALOG_PROCESSING, |p| p.processors.len())?;
            info!(processors, "Catalog pipeline assembled");
            Ok(())
        })
}

/// Tags every item whose name contains "eco" as sustainable.
struct EcoTagger;

impl ItemProcessor for EcoTagger {
    fn process(&self, item: &mut Item) {
        if item.name.to_lowercase().contains("eco") {
            item.tags.push("sustainable".to_string());
        }
    }
}

fn tagging_module() -> ModuleDescriptor {
    ModuleDescriptor::new("tagging", "catalog")
        .on_register(|ctx| {
            ctx.extend(CATALOG_PROCESSING);
            Ok(())
        })
        .on_init(|ctx| async move {
            ctx.with_extension_point_mut(CATALOG_PROCESSING, |p| p.add_processor(EcoTagger))?;
            info!("Tagging processor contributed");
            Ok(())
        })
}

#[derive(Debug, Deserialize, Default)]
struct StorefrontConfig {
    #[serde(default)]
    featured: Vec<String>,
}

fn storefront_plugin() -> PluginDescriptor {
    PluginDescriptor::new("storefront")
        .on_register(|ctx| {
            ctx.depend_on(CATALOG_STORE);
            ctx.depend_on(CONFIG_SERVICE);
            Ok(())
        })
        .on_init(|ctx| async move {
            let store = ctx.service(CATALOG_STORE)?;
            let config: StorefrontConfig = ctx.service(CONFIG_SERVICE)?.get("storefront")?;

            for name in &config.featured {
                store.insert(Item {
                    name: name.clone(),
                    tags: Vec::new(),
                });
            }
            info!(items = store.len(), "Storefront seeded from configuration");
            Ok(())
        })
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = trellis::runtime::TrellisConfig::default();
    config.plugins.insert(
        "storefront".to_string(),
        serde_json::json!({ "featured": ["Eco Bottle", "Desk Lamp"] }),
    );

    let mut runtime = TrellisRuntime::from_config(&config);
    runtime.add_plugin(catalog_plugin())?;
    runtime.add_module(tagging_module())?;
    runtime.add_plugin(storefront_plugin())?;

    runtime.start().await?;
    info!(order = ?runtime.manager().initialization_order(), "Startup complete");

    // Exercise the composed pipeline: run one item through the processors
    // the modules contributed, then store it.
    let store = runtime.manager().services().resolve(CATALOG_STORE).await?;
    let mut item = Item {
        name: "Eco Mug".to_string(),
        tags: Vec::new(),
    };
    runtime
        .manager()
        .extension_points()
        .with(CATALOG_PROCESSING, |pipeline| {
            for processor in &pipeline.processors {
                processor.process(&mut item);
            }
        })?;
    store.insert(item.clone());

    info!(name = %item.name, tags = ?item.tags, total = store.len(), "Item processed");
    Ok(())
}
