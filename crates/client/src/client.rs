//! Download client trait.

use crate::error::Result;
use crate::torrent::TorrentRef;
use async_trait::async_trait;
use std::path::Path;

/// Outcome of asking a client to add a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// The torrent was accepted and queued for download.
    Queued,
    /// The client already knew this torrent.
    Duplicate,
    /// Nothing was sent to the client (dry run).
    Skipped,
}

/// Outcome of asking a client to remove a torrent and its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    /// The torrent and its downloaded data were deleted.
    Deleted,
    /// The client has no torrent by that name. Not an error: the file may
    /// have been added to the repository by other means.
    NotFound,
    /// Nothing was sent to the client (dry run).
    Skipped,
}

/// Unified interface for BitTorrent clients.
///
/// The client is the only component allowed to change the repository: it
/// downloads added torrents into a destination directory and deletes the data
/// of removed ones.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use zimsync_client::{DownloadClient, TorrentRef, Removed, error::Result};
///
/// async fn replace(client: &dyn DownloadClient, torrent: &TorrentRef, old: &str) -> Result<()> {
///     client.add(torrent, Path::new("/srv/zim")).await?;
///     if client.remove(old).await? == Removed::NotFound {
///         println!("{old} was not managed by {}", client.name());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Name of the client, used for logging only.
    fn name(&self) -> &str;

    /// Queue a torrent for download into `destination`.
    async fn add(&self, torrent: &TorrentRef, destination: &Path) -> Result<Added>;

    /// Remove the torrent named `name` (the archive file name, extension
    /// included) and delete its data.
    async fn remove(&self, name: &str) -> Result<Removed>;
}
