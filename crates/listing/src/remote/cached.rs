use super::RemoteLister;
use crate::ListerHandle;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serves the remote listing from a plain-text cache file when one exists.
///
/// A present cache file is trusted as-is for the whole run; there is no
/// expiry. When the file is absent, the inner lister is asked and, if
/// `persist` is set, its output is written to the cache for the next run.
pub struct CachedLister {
    inner: ListerHandle,
    cache: PathBuf,
    persist: bool,
}

impl CachedLister {
    pub fn new(inner: ListerHandle, cache: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache: cache.into(),
            persist: false,
        }
    }

    /// Write fresh listings back to the cache file.
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache
    }
}

#[async_trait]
impl RemoteLister for CachedLister {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list(&self) -> Result<String> {
        match fs::read(&self.cache).await {
            Ok(bytes) => {
                tracing::info!(cache = %self.cache.display(), "Using cached remote listing");
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            // An unreadable cache is only a missed shortcut.
            Err(e) => tracing::warn!(cache = %self.cache.display(), error = %e, "Ignoring unreadable listing cache"),
        }
        let listing = self.inner.list().await?;
        if self.persist {
            match fs::write(&self.cache, listing.as_bytes()).await {
                Ok(()) => tracing::debug!(cache = %self.cache.display(), "Remote listing cached"),
                Err(e) => tracing::warn!(cache = %self.cache.display(), error = %e, "Could not write listing cache"),
            }
        }
        Ok(listing)
    }
}
