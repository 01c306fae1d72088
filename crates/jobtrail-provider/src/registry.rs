//! In-memory provider definition registry.

use crate::{
    definition::ProviderDefinition,
    error::{ProviderError, Result},
    loader::ProviderLoader,
};
use jobtrail_core::ProviderId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// In-memory cache of provider definitions.
///
/// The registry loads definitions from disk and caches them in memory for
/// fast lookups.
#[derive(Clone)]
pub struct ProviderRegistry {
    /// Cached provider definitions, indexed by provider ID
    definitions: Arc<RwLock<HashMap<ProviderId, ProviderDefinition>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry and load all definitions from the given loader.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn load_from(loader: &ProviderLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Reload all provider definitions from the loader.
    ///
    /// This replaces the current cache with freshly loaded definitions.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn reload(&self, loader: &ProviderLoader) -> Result<()> {
        let definitions = loader.load_all()?;

        let mut cache = self
            .definitions
            .write()
            .expect("acquire write lock on definitions");

        cache.clear();

        for definition in definitions {
            let provider_id = definition.id().clone();
            cache.insert(provider_id, definition);
        }

        info!(count = cache.len(), "reloaded provider definitions");

        Ok(())
    }

    /// Get a provider definition by ID.
    ///
    /// # Errors
    /// Returns error if the provider is not found.
    pub fn get(&self, provider_id: &ProviderId) -> Result<ProviderDefinition> {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        cache
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                provider_id: provider_id.to_string(),
            })
    }

    /// Get all provider definitions.
    #[must_use]
    pub fn get_all(&self) -> Vec<ProviderDefinition> {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        let mut all: Vec<ProviderDefinition> = cache.values().cloned().collect();
        // Deterministic run order regardless of hash state
        all.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        all
    }

    /// Get the total number of providers in the registry.
    #[must_use]
    pub fn count(&self) -> usize {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        cache.len()
    }

    /// Check if a provider exists in the registry.
    #[must_use]
    pub fn contains(&self, provider_id: &ProviderId) -> bool {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        cache.contains_key(provider_id)
    }

    /// Add or update a provider definition in the registry.
    ///
    /// This is useful for testing or dynamic updates.
    pub fn insert(&self, definition: ProviderDefinition) -> Result<()> {
        definition.validate()?;

        let mut cache = self
            .definitions
            .write()
            .expect("acquire write lock on definitions");

        let provider_id = definition.id().clone();
        cache.insert(provider_id.clone(), definition);

        debug!(provider_id = %provider_id, "inserted provider definition");

        Ok(())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
