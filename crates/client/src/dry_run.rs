//! Dry-run download client.
//!
//! Wraps another client and drops every change it would make, logging an
//! [`info event`](tracing::Event) instead and reporting the operation as
//! skipped.

use crate::client::{Added, DownloadClient, Removed};
use crate::error::Result;
use crate::torrent::TorrentRef;
use crate::ClientHandle;
use async_trait::async_trait;
use std::path::Path;

#[derive(Clone)]
pub struct DryRunClient {
    inner: ClientHandle,
}
impl DryRunClient {
    pub fn new(inner: ClientHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DownloadClient for DryRunClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn add(&self, torrent: &TorrentRef, destination: &Path) -> Result<Added> {
        tracing::info!(%torrent, destination = %destination.display(), "Skipping torrent add during dry run");
        Ok(Added::Skipped)
    }

    async fn remove(&self, name: &str) -> Result<Removed> {
        tracing::info!(name, "Skipping torrent removal during dry run");
        Ok(Removed::Skipped)
    }
}
