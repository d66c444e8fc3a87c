//! Resource locator
//!
//! Expands alias tokens (`~/js/app{min:.min}.js`) into resource URLs.

use crate::config::LocatorConfig;
use crate::module::traits::LoaderError;

const MIN_PATTERN: &str = "{min:";

/// Resolves locator tokens into fully-qualified resource URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    base_path: String,
    alias_prefix: char,
    minified: bool,
}

impl ResourceLocator {
    pub fn new(base_path: impl Into<String>, alias_prefix: char, minified: bool) -> Self {
        Self {
            base_path: base_path.into(),
            alias_prefix,
            minified,
        }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(config.base_path.clone(), config.alias_prefix, config.minified)
    }

    pub fn with_minified(mut self, minified: bool) -> Self {
        self.minified = minified;
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn minified(&self) -> bool {
        self.minified
    }

    /// Resolve a token into a URL
    ///
    /// Every `{min:<suffix>}` fragment becomes `<suffix>` in minified mode and
    /// is dropped otherwise. Tokens starting with the alias prefix are joined
    /// onto the base path; anything else (absolute URLs included) is kept.
    pub fn resolve(&self, token: &str) -> Result<String, LoaderError> {
        let expanded = self.expand_min_patterns(token)?;

        match expanded.strip_prefix(self.alias_prefix) {
            Some(rest) => {
                let base = self.base_path.trim_end_matches('/');
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    Ok(base.to_string())
                } else {
                    Ok(format!("{}/{}", base, rest))
                }
            }
            None => Ok(expanded),
        }
    }

    fn expand_min_patterns(&self, token: &str) -> Result<String, LoaderError> {
        let mut output = String::with_capacity(token.len());
        let mut rest = token;

        while let Some(start) = rest.find(MIN_PATTERN) {
            output.push_str(&rest[..start]);
            let after = &rest[start + MIN_PATTERN.len()..];
            let end = after.find('}').ok_or_else(|| {
                LoaderError::InvalidResource(format!("unterminated {{min:}} pattern in {}", token))
            })?;
            if self.minified {
                output.push_str(&after[..end]);
            }
            rest = &after[end + 1..];
        }
        output.push_str(rest);

        Ok(output)
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::from_config(&LocatorConfig::default())
    }
}
