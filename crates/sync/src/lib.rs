mod driver;
pub mod error;
mod event;

pub use crate::driver::sync;
pub use crate::event::{Summary, SyncEvent};
use std::path::PathBuf;
use zimsync_archive::Library;

/// Everything a sync run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct Context {
    /// Logical names to mirror.
    pub library: Library,
    /// Directory holding local archives; also the download destination.
    pub repository: PathBuf,
    /// Archive file extension, without the dot.
    pub extension: String,
    /// Base URL torrent paths are appended to.
    pub server: String,
    /// Former versions kept next to the newest local copy.
    pub keep: usize,
    pub concurrency: usize,
}
