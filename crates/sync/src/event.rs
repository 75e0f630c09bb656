use zimsync_archive::ArchiveIdentity;
use zimsync_client::TorrentRef;

/// Progress events emitted by [`sync`](crate::sync).
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`LocalScanned`](Self::LocalScanned), with the number of local archives.
/// 3. [`Removed`](Self::Removed), once per former version handed to the client
///    for deletion, with what the client made of it.
/// 4. [`Rescanned`](Self::Rescanned), after every removal has completed.
/// 5. [`RemoteListed`](Self::RemoteListed), with the number of published
///    archives (zero when the listing could not be obtained).
/// 6. [`Unavailable`](Self::Unavailable) and [`UpToDate`](Self::UpToDate), once
///    per library name concerned.
/// 7. [`Added`](Self::Added), once per archive handed to the client for
///    download.
/// 8. [`Complete`](Self::Complete), exactly once.
///
/// Failed removals and additions are yielded as `Err` items in place of
/// their event. Only a repository that cannot be opened ends the stream
/// early, in which case [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    LocalScanned(usize),
    Removed {
        archive: ArchiveIdentity,
        outcome: zimsync_client::Removed,
    },
    Rescanned(usize),
    RemoteListed(usize),
    /// A library name the remote listing does not publish.
    Unavailable(String),
    /// A library name whose newest publication is already local.
    UpToDate(String),
    Added {
        archive: ArchiveIdentity,
        torrent: TorrentRef,
        outcome: zimsync_client::Added,
    },
    Complete(Summary),
}

/// Counts for a finished run.
///
/// `removed` and `added` only count changes the client actually made. A
/// torrent the client did not know, one it already had, or any request
/// skipped during a dry run counts as `skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub removed: usize,
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    pub up_to_date: usize,
    pub unavailable: usize,
}
