//! Resource references, URL resolution and fetching
//!
//! A module's resources are script or style references written as locator
//! tokens. They are resolved to URLs when the module starts loading its own
//! resources, and fetched at most once per URL across the whole loader.

pub mod fetcher;
pub mod locator;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::module::registry::ModuleId;
use crate::module::traits::LoaderError;

pub use fetcher::{FetchCompletion, FetchOutcome, FetchRequest, FileSystemFetcher, RequestId};
pub use locator::ResourceLocator;

/// Resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Style,
}

impl ResourceKind {
    /// Infer the kind from a token's extension (`.css` is a style)
    pub fn infer(token: &str) -> Self {
        let path = token.split(['?', '#']).next().unwrap_or(token);
        let path = path.replace("{min:", "").replace('}', "");
        if path.to_ascii_lowercase().ends_with(".css") {
            ResourceKind::Style
        } else {
            ResourceKind::Script
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Script => f.write_str("script"),
            ResourceKind::Style => f.write_str("style"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Location {
    Token(String),
    Url(String),
}

/// A script or style reference, unresolved (locator token) or resolved (URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    location: Location,
    kind: ResourceKind,
}

impl ResourceReference {
    /// Unresolved reference with an explicit kind
    pub fn new(token: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            location: Location::Token(token.into()),
            kind,
        }
    }

    pub fn script(token: impl Into<String>) -> Self {
        Self::new(token, ResourceKind::Script)
    }

    pub fn style(token: impl Into<String>) -> Self {
        Self::new(token, ResourceKind::Style)
    }

    /// Unresolved reference whose kind is inferred from the extension
    pub fn inferred(token: impl Into<String>) -> Self {
        let token = token.into();
        let kind = ResourceKind::infer(&token);
        Self::new(token, kind)
    }

    /// Already-resolved reference; the locator leaves it untouched
    pub fn resolved(url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            location: Location::Url(url.into()),
            kind,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.location, Location::Url(_))
    }

    /// The token or URL text
    pub fn as_str(&self) -> &str {
        match &self.location {
            Location::Token(token) => token,
            Location::Url(url) => url,
        }
    }

    /// The URL, once resolved
    pub fn url(&self) -> Option<&str> {
        match &self.location {
            Location::Url(url) => Some(url),
            Location::Token(_) => None,
        }
    }

    /// Resolve through `locator`; resolved references are returned as-is
    pub fn resolve_with(&self, locator: &ResourceLocator) -> Result<ResourceReference, LoaderError> {
        match &self.location {
            Location::Url(_) => Ok(self.clone()),
            Location::Token(token) => Ok(Self::resolved(locator.resolve(token)?, self.kind)),
        }
    }
}

impl From<&str> for ResourceReference {
    fn from(token: &str) -> Self {
        Self::inferred(token)
    }
}

impl From<String> for ResourceReference {
    fn from(token: String) -> Self {
        Self::inferred(token)
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.as_str())
    }
}

/// Fetch status of one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResourceStatus {
    /// Fetch in flight; modules waiting on it
    Pending(Vec<ModuleId>),
    Loaded,
    Failed(String),
}

/// Result of asking the cache for a URL on behalf of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// Already fetched, nothing to wait for
    Loaded,
    /// A fetch is in flight; the module was added as a waiter
    Joined,
    /// Caller must issue a fetch; the module is the first waiter
    Fetch,
}

/// Per-URL fetch bookkeeping guaranteeing one fetch per URL
#[derive(Debug, Default)]
pub(crate) struct ResourceCache {
    entries: HashMap<String, (ResourceKind, ResourceStatus)>,
    requests: HashMap<RequestId, String>,
}

impl ResourceCache {
    pub(crate) fn acquire(&mut self, url: &str, kind: ResourceKind, module: ModuleId) -> Acquire {
        match self.entries.get_mut(url) {
            Some((_, ResourceStatus::Loaded)) => Acquire::Loaded,
            Some((_, ResourceStatus::Pending(waiters))) => {
                waiters.push(module);
                Acquire::Joined
            }
            Some((_, ResourceStatus::Failed(_))) | None => {
                self.entries.insert(
                    url.to_string(),
                    (kind, ResourceStatus::Pending(vec![module])),
                );
                Acquire::Fetch
            }
        }
    }

    pub(crate) fn register_request(&mut self, request: RequestId, url: &str) {
        self.requests.insert(request, url.to_string());
    }

    /// Record a fetch result; returns the URL, its kind and the waiting modules
    pub(crate) fn settle(
        &mut self,
        request: RequestId,
        result: Result<(), String>,
    ) -> Option<(String, ResourceKind, Vec<ModuleId>)> {
        let url = self.requests.remove(&request)?;
        let (kind, status) = self.entries.get_mut(&url)?;
        let waiters = match std::mem::replace(status, ResourceStatus::Loaded) {
            ResourceStatus::Pending(waiters) => waiters,
            _ => Vec::new(),
        };
        if let Err(reason) = result {
            *status = ResourceStatus::Failed(reason);
        }
        Some((url, *kind, waiters))
    }

    /// Stop `module` from waiting on any in-flight fetch
    pub(crate) fn drop_waiter(&mut self, module: ModuleId) {
        for (_, status) in self.entries.values_mut() {
            if let ResourceStatus::Pending(waiters) = status {
                waiters.retain(|w| *w != module);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self, url: &str) -> Option<&ResourceStatus> {
        self.entries.get(url).map(|(_, status)| status)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.requests.len()
    }
}
