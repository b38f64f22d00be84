//! Host-defined services the runtime makes available to every plugin.
//!
//! The runtime defines these in the manager's service registry before
//! startup, so plugins declare them with
//! [`depend_on`](trellis_framework::RegistrationContext::depend_on) like any
//! service another plugin would provide.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tracing::warn;

use trellis_core::ServiceRef;

use crate::error::{RuntimeError, RuntimeResult};

/// Reference to the configuration service defined by the runtime.
pub const CONFIG_SERVICE: ServiceRef<ConfigService> = ServiceRef::new("trellis.config");

/// Read-only access to the per-plugin configuration sections.
///
/// Sections come from the `plugins` table of the loaded configuration and
/// are keyed by plugin id.  The runtime stores them as raw JSON values;
/// each plugin deserializes its own section into whatever type it expects.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Deserialize, Default)]
/// struct CatalogConfig {
///     page_size: usize,
/// }
///
/// let config = ctx.service(CONFIG_SERVICE)?;
/// let catalog: CatalogConfig = config.get("catalog")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    sections: HashMap<String, serde_json::Value>,
}

impl ConfigService {
    /// Creates a service over the given plugin sections.
    pub fn new(sections: HashMap<String, serde_json::Value>) -> Self {
        Self { sections }
    }

    /// Returns the raw section for a plugin id, if configured.
    pub fn section(&self, id: &str) -> Option<&serde_json::Value> {
        self.sections.get(id)
    }

    /// Returns `true` if a section exists for the given plugin id.
    pub fn has_section(&self, id: &str) -> bool {
        self.sections.contains_key(id)
    }

    /// Deserializes the section for a plugin id.
    ///
    /// Falls back to `T::default()` when no section is configured; a section
    /// that exists but does not match `T` is an error.
    pub fn get<T: DeserializeOwned + Default>(&self, id: &str) -> RuntimeResult<T> {
        match self.sections.get(id) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                RuntimeError::PluginConfigDeserialize(format!(
                    "Failed to deserialize config section '{id}': {e}"
                ))
            }),
            None => {
                warn!(plugin = id, "No configuration section found, using default");
                Ok(T::default())
            }
        }
    }
}
