//! Manifest validation framework
//!
//! Validates module manifests for structure and identifier hygiene before
//! anything is declared.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::module::registry::descriptor::ReadySignal;
use crate::module::registry::manifest::{ManifestModule, ModuleManifest};

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Manifest is valid
    Valid,
    /// Manifest is invalid with specific errors
    Invalid(Vec<String>),
}

/// Whether `id` is a well-formed, namespace-qualified module identifier
///
/// Dot-separated segments; each segment non-empty, starting with an
/// alphanumeric character, containing only alphanumerics, `-` and `_`.
pub fn is_valid_identifier(id: &str) -> bool {
    if id.is_empty() || id.len() > 128 {
        return false;
    }

    id.split('.').all(|segment| {
        segment
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphanumeric())
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// Whether `name` can be a global-scope symbol (`[A-Za-z_$][A-Za-z0-9_$]*`)
pub fn is_valid_global_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Manifest validator
pub struct ManifestValidator {
    /// Maximum modules a single manifest may declare
    max_modules: usize,
}

impl ManifestValidator {
    /// Create a new manifest validator
    pub fn new() -> Self {
        Self { max_modules: 256 }
    }

    /// Validate a module manifest, collecting every problem
    pub fn validate(&self, manifest: &ModuleManifest) -> ValidationResult {
        let mut errors = Vec::new();

        if manifest.modules.is_empty() {
            errors.push("Manifest declares no modules".to_string());
        }
        if manifest.modules.len() > self.max_modules {
            errors.push(format!(
                "Manifest declares {} modules (max {})",
                manifest.modules.len(),
                self.max_modules
            ));
        }

        let mut seen = HashSet::new();
        for module in &manifest.modules {
            if !seen.insert(module.id.as_str()) {
                errors.push(format!("Module {} declared twice", module.id));
            }
            errors.extend(self.validate_module(module));
        }

        if errors.is_empty() {
            debug!(
                "Manifest validation passed ({} modules)",
                manifest.modules.len()
            );
            ValidationResult::Valid
        } else {
            warn!("Manifest validation failed: {:?}", errors);
            ValidationResult::Invalid(errors)
        }
    }

    fn validate_module(&self, module: &ManifestModule) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_valid_identifier(&module.id) {
            errors.push(format!(
                "Invalid module identifier: {:?} (dot-separated alphanumeric segments)",
                module.id
            ));
        }

        if module.scripts.is_empty() && module.styles.is_empty() {
            errors.push(format!("Module {} has no scripts or styles", module.id));
        }

        for token in module.scripts.iter().chain(module.styles.iter()) {
            if token.trim().is_empty() {
                errors.push(format!("Module {} has an empty resource token", module.id));
            }
        }

        let mut deps = HashSet::new();
        for dependency in &module.dependencies {
            if dependency == &module.id {
                errors.push(format!("Module {} depends on itself", module.id));
            } else if !is_valid_identifier(dependency) {
                errors.push(format!(
                    "Invalid dependency identifier {:?} in {}",
                    dependency, module.id
                ));
            }
            if !deps.insert(dependency.as_str()) {
                errors.push(format!(
                    "Module {} lists dependency {} twice",
                    module.id, dependency
                ));
            }
        }

        match &module.ready {
            ReadySignal::Immediate => {}
            ReadySignal::Global(symbol) | ReadySignal::Bridge(symbol) => {
                if !is_valid_global_name(symbol) {
                    errors.push(format!(
                        "Module {} has invalid ready symbol {:?}",
                        module.id, symbol
                    ));
                }
            }
        }

        errors
    }
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new()
    }
}
