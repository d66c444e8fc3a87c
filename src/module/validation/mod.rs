//! Manifest and identifier validation

pub mod manifest_validator;

pub use manifest_validator::{
    is_valid_global_name, is_valid_identifier, ManifestValidator, ValidationResult,
};
