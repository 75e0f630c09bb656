//! In-memory download client for testing.

use crate::client::{Added, DownloadClient, Removed};
use crate::error::{ErrorKind, Result};
use crate::torrent::TorrentRef;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Records every call it receives.
///
/// Removal only succeeds for names registered with [`with_torrents`](Self::with_torrents)
/// (or added earlier); anything else reports [`Removed::NotFound`]. Names
/// registered with [`failing_on`](Self::failing_on) make both operations fail.
#[derive(Default)]
pub struct MockClient {
    known: RwLock<HashSet<String>>,
    failing: HashSet<String>,
    added: RwLock<Vec<(TorrentRef, PathBuf)>>,
    removed: RwLock<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_torrents<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: RwLock::new(names.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Fail any add or remove whose torrent URL or name contains `pattern`.
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.failing.insert(pattern.into());
        self
    }

    pub async fn added(&self) -> Vec<(TorrentRef, PathBuf)> {
        self.added.read().await.clone()
    }

    /// Names of torrents that were actually removed.
    pub async fn removed(&self) -> Vec<String> {
        self.removed.read().await.clone()
    }

    fn fails(&self, subject: &str) -> bool {
        self.failing.iter().any(|pattern| subject.contains(pattern.as_str()))
    }
}

#[async_trait]
impl DownloadClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add(&self, torrent: &TorrentRef, destination: &Path) -> Result<Added> {
        if self.fails(torrent.as_str()) {
            exn::bail!(ErrorKind::Rpc(format!("mock refused {torrent}")));
        }
        let name = torrent.as_str().rsplit('/').next().unwrap_or_default();
        let name = name.strip_suffix(".torrent").unwrap_or(name).to_string();
        let fresh = self.known.write().await.insert(name);
        self.added.write().await.push((torrent.clone(), destination.to_path_buf()));
        Ok(if fresh { Added::Queued } else { Added::Duplicate })
    }

    async fn remove(&self, name: &str) -> Result<Removed> {
        if self.fails(name) {
            exn::bail!(ErrorKind::Rpc(format!("mock refused {name}")));
        }
        if !self.known.write().await.remove(name) {
            return Ok(Removed::NotFound);
        }
        self.removed.write().await.push(name.to_string());
        Ok(Removed::Deleted)
    }
}
