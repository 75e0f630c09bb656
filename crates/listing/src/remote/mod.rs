//! Remote publication listings.
//!
//! A [`RemoteLister`] produces the raw text of a server listing, one path-like
//! entry per line. Parsing that text into archives is left to
//! [`ArchiveSet::from_remote_listing`](zimsync_archive::ArchiveSet::from_remote_listing).

mod cached;
mod command;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::cached::CachedLister;
pub use self::command::CommandLister;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockLister;
use crate::error::Result;
use async_trait::async_trait;

/// Source of the raw remote listing.
///
/// # Examples
///
/// ```no_run
/// use zimsync_archive::ArchiveSet;
/// use zimsync_listing::remote::RemoteLister;
/// # use zimsync_listing::error::Result;
/// # async fn example(lister: &dyn RemoteLister) -> Result<()> {
/// let listing = lister.list().await?;
/// let remote = ArchiveSet::from_remote_listing(&listing, "zim");
/// println!("{} archives published", remote.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RemoteLister: Send + Sync {
    /// Name of the lister, used for logging only.
    fn name(&self) -> &str;

    /// Fetch the listing text.
    async fn list(&self) -> Result<String>;
}
