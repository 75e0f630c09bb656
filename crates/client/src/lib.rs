mod client;
mod dry_run;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod torrent;
mod transmission;

pub use crate::client::{Added, DownloadClient, Removed};
pub use crate::dry_run::DryRunClient;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockClient;
pub use crate::torrent::TorrentRef;
pub use crate::transmission::TransmissionClient;
use std::sync::Arc;

pub type ClientHandle = Arc<dyn DownloadClient + Send + Sync>;
