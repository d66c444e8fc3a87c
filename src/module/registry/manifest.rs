//! Module manifest parsing
//!
//! Handles parsing `*.module.toml` manifests, each declaring one or more
//! modules of a library.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::registry::descriptor::ReadySignal;
use crate::module::resource::ResourceReference;
use crate::module::traits::LoaderError;

/// One module entry of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestModule {
    /// Namespace-qualified identifier
    pub id: String,
    /// Identifiers of modules that must be ready first
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Script locator tokens; the first one is the primary resource
    #[serde(default)]
    pub scripts: Vec<String>,
    /// Stylesheet locator tokens
    #[serde(default)]
    pub styles: Vec<String>,
    /// Readiness condition after the resources loaded
    #[serde(default)]
    pub ready: ReadySignal,
}

impl ManifestModule {
    /// Scripts first, then styles
    pub fn resources(&self) -> Vec<ResourceReference> {
        self.scripts
            .iter()
            .map(ResourceReference::script)
            .chain(self.styles.iter().map(ResourceReference::style))
            .collect()
    }
}

/// Module manifest (`*.module.toml` structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    #[serde(default, rename = "module")]
    pub modules: Vec<ManifestModule>,
}

impl ModuleManifest {
    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LoaderError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, LoaderError> {
        let manifest: ModuleManifest = toml::from_str(contents).map_err(|e| {
            LoaderError::InvalidManifest(format!("Failed to parse manifest TOML: {}", e))
        })?;

        if manifest.modules.is_empty() {
            return Err(LoaderError::InvalidManifest(
                "Manifest declares no modules".to_string(),
            ));
        }

        Ok(manifest)
    }
}
