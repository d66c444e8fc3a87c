//! Test utilities for loader testing
//!
//! Provides a recording fetcher the tests settle by URL, and a fixture with
//! isolated manifest and static directories.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

use module_loader::{
    FetchCompletion, FetchOutcome, FetchRequest, Loader, LoaderEventSender, ResourceFetcher,
    ResourceLocator,
};

#[derive(Default)]
struct FetchLog {
    requests: Vec<FetchRequest>,
    pending: Vec<FetchCompletion>,
    auto_complete: bool,
}

/// Fetcher that records every request and holds its completion
///
/// Clones share state, so a test keeps one clone while the loader owns
/// another.
#[derive(Clone, Default)]
pub struct MockFetcher {
    log: Rc<RefCell<FetchLog>>,
}

impl ResourceFetcher for MockFetcher {
    fn fetch(&mut self, request: FetchRequest, completion: FetchCompletion) {
        let mut log = self.log.borrow_mut();
        log.requests.push(request);
        if log.auto_complete {
            completion.succeed(FetchOutcome::default());
        } else {
            log.pending.push(completion);
        }
    }
}

impl MockFetcher {
    /// Fetcher that succeeds every request as soon as it is issued
    pub fn auto_completing() -> Self {
        let fetcher = Self::default();
        fetcher.log.borrow_mut().auto_complete = true;
        fetcher
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.log.borrow().requests.clone()
    }

    /// URLs in the order they were requested
    pub fn urls(&self) -> Vec<String> {
        self.log
            .borrow()
            .requests
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.log
            .borrow()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn pending(&self) -> usize {
        self.log.borrow().pending.len()
    }

    /// Sender a fetched script for `url` would use to call globals
    pub fn events_for(&self, url: &str) -> Option<LoaderEventSender> {
        self.log
            .borrow()
            .pending
            .iter()
            .find(|c| c.url() == url)
            .map(|c| c.events())
    }

    fn take(&self, url: &str) -> Option<FetchCompletion> {
        let mut log = self.log.borrow_mut();
        let position = log.pending.iter().position(|c| c.url() == url)?;
        Some(log.pending.remove(position))
    }

    /// Succeed the pending fetch of `url`; false if there is none
    pub fn complete(&self, url: &str) -> bool {
        self.complete_defining(url, &[])
    }

    /// Succeed the pending fetch of `url`, defining global symbols
    pub fn complete_defining(&self, url: &str, symbols: &[&str]) -> bool {
        match self.take(url) {
            Some(completion) => {
                completion.succeed(FetchOutcome::defining(symbols.iter().copied()));
                true
            }
            None => false,
        }
    }

    /// Fail the pending fetch of `url`; false if there is none
    pub fn fail(&self, url: &str, reason: &str) -> bool {
        match self.take(url) {
            Some(completion) => {
                completion.fail(reason);
                true
            }
            None => false,
        }
    }

    /// Succeed every pending fetch
    pub fn complete_all(&self) -> usize {
        let pending: Vec<FetchCompletion> = self.log.borrow_mut().pending.drain(..).collect();
        let count = pending.len();
        for completion in pending {
            completion.succeed(FetchOutcome::default());
        }
        count
    }
}

/// Loader resolving `~` to `/static` with a fresh mock fetcher
pub fn test_loader() -> (Loader, MockFetcher) {
    let fetcher = MockFetcher::default();
    let loader = Loader::new(ResourceLocator::new("/static", '~', false), fetcher.clone());
    (loader, fetcher)
}

/// Shared, ordered log of what continuations did
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

/// Test fixture with isolated manifest and static directories
pub struct LoaderTestFixture {
    /// Temporary directory for test data
    pub temp_dir: TempDir,
    /// Manifests directory path
    pub manifests_dir: PathBuf,
    /// Directory served under the `/static` base path
    pub static_dir: PathBuf,
}

impl LoaderTestFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let manifests_dir = temp_dir.path().join("modules");
        let static_dir = temp_dir.path().join("static");
        std::fs::create_dir_all(&manifests_dir)?;
        std::fs::create_dir_all(&static_dir)?;

        Ok(Self {
            temp_dir,
            manifests_dir,
            static_dir,
        })
    }

    /// Write a manifest relative to the manifests directory
    pub fn write_manifest<P: AsRef<Path>>(
        &self,
        relative: P,
        contents: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        write_file(&self.manifests_dir.join(relative), contents)
    }

    /// Write a resource relative to the static directory
    pub fn write_static<P: AsRef<Path>>(
        &self,
        relative: P,
        contents: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        write_file(&self.static_dir.join(relative), contents)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(path.to_path_buf())
}
