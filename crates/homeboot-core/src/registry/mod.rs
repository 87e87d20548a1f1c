//! Plugin-based provider registry
//!
//! DDNS providers register a factory under their type name, and the binary
//! resolves `ProviderConfig` through the registry instead of matching on
//! concrete provider crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use homeboot_core::registry::ProviderRegistry;
//! use homeboot_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! homeboot_provider_duckdns::register(&registry);
//!
//! let provider = registry.create_provider(&ProviderConfig::default())?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("duckdns", Box::new(DuckDnsFactory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DdnsProvider, DdnsProviderFactory};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

type FactoryMap = HashMap<String, Box<dyn DdnsProviderFactory>>;

/// Registry of DDNS provider factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: concurrent reads, exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<FactoryMap>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory under `name`
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DdnsProviderFactory>) {
        let mut providers = match self.providers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        providers.insert(name.into(), factory);
    }

    /// Create a provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DdnsProvider>)`: Created provider instance
    /// - `Err(Error::Config)`: The provider type is not registered
    /// - `Err(Error)`: The factory rejected the configuration
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DdnsProvider>> {
        let provider_type = config.type_name();
        let providers = self.read()?;

        let factory = providers.get(provider_type).ok_or_else(|| {
            Error::config(format!(
                "Unknown provider type: {} (registered: {})",
                provider_type,
                sorted_names(&providers).join(", ")
            ))
        })?;

        factory.create(config)
    }

    /// Registered provider type names, sorted
    pub fn list_providers(&self) -> Vec<String> {
        match self.read() {
            Ok(providers) => sorted_names(&providers),
            Err(_) => Vec::new(),
        }
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.read()
            .map(|providers| providers.contains_key(name))
            .unwrap_or(false)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, FactoryMap>> {
        self.providers
            .read()
            .map_err(|e| Error::Other(format!("provider registry lock poisoned: {}", e)))
    }
}

fn sorted_names(providers: &FactoryMap) -> Vec<String> {
    let mut names: Vec<String> = providers.keys().cloned().collect();
    names.sort();
    names
}
