//! Provider definition loading from TOML files.
//!
//! This module handles loading provider definitions from the
//! `provider-definitions/` directory.

use crate::{
    definition::ProviderDefinition,
    error::{ProviderError, Result},
};
use jobtrail_core::ProviderId;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loader for provider definitions from TOML files.
pub struct ProviderLoader {
    /// Base directory containing provider definitions
    definitions_dir: PathBuf,
}

impl ProviderLoader {
    /// Create a new loader with the given definitions directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Result<Self> {
        let definitions_dir = definitions_dir.into();

        if !definitions_dir.exists() || !definitions_dir.is_dir() {
            return Err(ProviderError::DirectoryNotFound {
                path: definitions_dir.display().to_string(),
            });
        }

        Ok(Self { definitions_dir })
    }

    /// Create a loader using the default definitions directory.
    ///
    /// Looks for `provider-definitions/` relative to the workspace root.
    ///
    /// # Errors
    /// Returns error if the default directory doesn't exist.
    pub fn with_default_dir() -> Result<Self> {
        // Find workspace root by looking for Cargo.toml with [workspace]
        let mut current_dir = std::env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                    if contents.contains("[workspace]") {
                        let definitions_dir = current_dir.join("provider-definitions");
                        return Self::new(definitions_dir);
                    }
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        // Fallback: try relative path
        let definitions_dir = PathBuf::from("provider-definitions");
        Self::new(definitions_dir)
    }

    /// Load a single provider definition by ID.
    ///
    /// # Errors
    /// Returns error if the definition file doesn't exist, can't be read, or
    /// is invalid.
    pub fn load(&self, provider_id: &ProviderId) -> Result<ProviderDefinition> {
        let path = self.definitions_dir.join(format!("{provider_id}.toml"));
        if !path.exists() {
            return Err(ProviderError::NotFound {
                provider_id: provider_id.to_string(),
            });
        }

        let definition = Self::load_file(&path)?;
        definition.validate()?;

        debug!(
            provider_id = %provider_id,
            name = %definition.name(),
            "loaded provider definition"
        );

        Ok(definition)
    }

    /// Load all provider definitions from the definitions directory.
    ///
    /// Invalid definitions are logged as warnings and skipped.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<ProviderDefinition>> {
        let mut definitions = Vec::new();

        for entry in std::fs::read_dir(&self.definitions_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            match Self::load_file(&path).and_then(|def| {
                def.validate()?;
                Ok(def)
            }) {
                Ok(definition) => definitions.push(definition),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping invalid provider definition");
                }
            }
        }

        info!(
            count = definitions.len(),
            dir = %self.definitions_dir.display(),
            "loaded provider definitions"
        );

        Ok(definitions)
    }

    fn load_file(path: &Path) -> Result<ProviderDefinition> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| ProviderError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }
}
