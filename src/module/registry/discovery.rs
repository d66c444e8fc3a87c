//! Manifest discovery
//!
//! Scans a manifests directory (and its immediate subdirectories) for
//! `*.module.toml` files.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::LoaderError;
use crate::module::validation::{ManifestValidator, ValidationResult};

/// File name suffix identifying a manifest
pub const MANIFEST_SUFFIX: &str = ".module.toml";

/// Discovered manifest
#[derive(Debug, Clone)]
pub struct DiscoveredManifest {
    /// Manifest file path
    pub path: PathBuf,
    /// Parsed manifest
    pub manifest: ModuleManifest,
}

/// Manifest discovery scanner
pub struct ManifestDiscovery {
    /// Base directory to scan
    manifests_dir: PathBuf,
}

impl ManifestDiscovery {
    /// Create a new manifest discovery scanner
    pub fn new<P: AsRef<Path>>(manifests_dir: P) -> Self {
        Self {
            manifests_dir: manifests_dir.as_ref().to_path_buf(),
        }
    }

    /// Discover every valid manifest, in sorted path order
    ///
    /// Manifests that fail to parse or validate are skipped with a warning.
    pub fn discover_manifests(&self) -> Result<Vec<DiscoveredManifest>, LoaderError> {
        info!("Discovering manifests in {:?}", self.manifests_dir);

        if !self.manifests_dir.exists() {
            debug!("Manifests directory {:?} does not exist", self.manifests_dir);
            return Ok(Vec::new());
        }

        let validator = ManifestValidator::new();
        let mut manifests = Vec::new();

        for path in self.manifest_paths()? {
            match ModuleManifest::from_file(&path) {
                Ok(manifest) => match validator.validate(&manifest) {
                    ValidationResult::Valid => {
                        debug!("Manifest validated: {:?}", path);
                        manifests.push(DiscoveredManifest { path, manifest });
                    }
                    ValidationResult::Invalid(errors) => {
                        warn!("Skipping invalid manifest {:?}: {:?}", path, errors);
                    }
                },
                Err(e) => {
                    warn!("Failed to parse manifest {:?}: {}", path, e);
                }
            }
        }

        info!("Discovered {} manifests", manifests.len());
        Ok(manifests)
    }

    /// Paths of every manifest file, sorted
    pub fn manifest_paths(&self) -> Result<Vec<PathBuf>, LoaderError> {
        let mut paths = Vec::new();
        for entry in read_dir(&self.manifests_dir)? {
            if entry.is_dir() {
                paths.extend(read_dir(&entry)?.into_iter().filter(|p| is_manifest(p)));
            } else if is_manifest(&entry) {
                paths.push(entry);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        LoaderError::Io(format!("Failed to read directory {:?}: {}", dir, e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| LoaderError::Io(format!("Failed to read directory entry: {}", e)))?;
        paths.push(entry.path());
    }
    Ok(paths)
}

fn is_manifest(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.ends_with(MANIFEST_SUFFIX))
}
