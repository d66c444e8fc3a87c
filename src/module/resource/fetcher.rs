//! Fetch requests, completions and the file system fetcher

use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::module::loader::queue::{LoaderEvent, LoaderEventSender};
use crate::module::resource::ResourceKind;
use crate::module::traits::ResourceFetcher;

/// Identifier of one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fetch the loader asks a `ResourceFetcher` to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub url: String,
    pub kind: ResourceKind,
    /// Module that first asked for this URL
    pub module: String,
}

/// What a successfully fetched resource brought into the global scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Global symbols defined by the resource
    pub defines: Vec<String>,
}

impl FetchOutcome {
    pub fn defining<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            defines: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

/// One-shot completion slot for a fetch
///
/// Consumed by `succeed` or `fail`; dropping it without either leaves the
/// request pending forever.
#[derive(Debug)]
pub struct FetchCompletion {
    request: RequestId,
    url: String,
    events: LoaderEventSender,
}

impl FetchCompletion {
    pub(crate) fn new(request: RequestId, url: String, events: LoaderEventSender) -> Self {
        Self {
            request,
            url,
            events,
        }
    }

    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sender a fetched script can use to invoke bridge globals
    pub fn events(&self) -> LoaderEventSender {
        self.events.clone()
    }

    pub fn succeed(self, outcome: FetchOutcome) {
        self.settle(Ok(outcome));
    }

    pub fn fail(self, reason: impl Into<String>) {
        self.settle(Err(reason.into()));
    }

    fn settle(self, result: Result<FetchOutcome, String>) {
        let event = LoaderEvent::FetchSettled {
            request: self.request,
            result,
        };
        if !self.events.send(event) {
            debug!("Loader gone, dropping completion for {}", self.url);
        }
    }
}

/// Serves resources from a local directory
///
/// URLs under `base_path` map onto files under `root`. Reads run on the
/// current tokio runtime; remote URLs and paths escaping `root` fail.
pub struct FileSystemFetcher {
    root: PathBuf,
    base_path: String,
}

impl FileSystemFetcher {
    pub fn new<P: AsRef<Path>>(root: P, base_path: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_path: base_path.into(),
        }
    }

    /// Map a URL onto a file under the root
    pub fn path_for(&self, url: &str) -> Result<PathBuf, String> {
        if url.contains("://") || url.starts_with("//") {
            return Err(format!("remote resource {} cannot be served from disk", url));
        }

        let path = url.split(['?', '#']).next().unwrap_or(url);
        let base = self.base_path.trim_end_matches('/');
        let relative = path
            .strip_prefix(base)
            .unwrap_or(path)
            .trim_start_matches('/');

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(format!("resource path {} escapes the root", url));
        }

        Ok(self.root.join(relative))
    }
}

impl ResourceFetcher for FileSystemFetcher {
    fn fetch(&mut self, request: FetchRequest, completion: FetchCompletion) {
        let path = match self.path_for(&request.url) {
            Ok(path) => path,
            Err(reason) => {
                warn!("{}", reason);
                completion.fail(reason);
                return;
            }
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                completion.fail(format!("no async runtime available: {}", e));
                return;
            }
        };

        debug!("Reading {} from {:?}", request.url, path);
        handle.spawn(async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!("Read {} bytes from {:?}", bytes.len(), path);
                    completion.succeed(FetchOutcome::default());
                }
                Err(e) => completion.fail(format!("{}: {}", path.display(), e)),
            }
        });
    }
}
