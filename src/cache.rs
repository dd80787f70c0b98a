//! On-disk response cache.
//!
//! # Responsibilities
//! - Persist full origin responses keyed by the literal request target
//! - Serve cached responses without contacting the origin
//!
//! # Design Decisions
//! - One file per key under a single root directory, created lazily
//! - File name is the URL-safe base64 of the key, so keys containing `/`
//!   (every absolute URL) stay inside the root
//! - No locking: concurrent writers to one key are last-writer-wins

use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tokio::fs;

/// File extension for cache entries.
const ENTRY_SUFFIX: &str = ".cache";

/// A best-effort byte cache rooted at one directory.
///
/// Cheap to clone; every handle points at the same directory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    /// Create a cache handle rooted at `root`. The directory itself is not
    /// created until the first [`save`](Self::save).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the cache entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(key.as_bytes());
        self.root.join(name + ENTRY_SUFFIX)
    }

    /// Look up the response stored under `key`.
    ///
    /// Returns `Ok(None)` when no entry exists. Other storage failures are
    /// surfaced for the caller to log; they are never fatal to the server.
    pub async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `bytes` under `key`, overwriting any previous entry.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        fs::write(self.entry_path(key), bytes).await
    }
}
