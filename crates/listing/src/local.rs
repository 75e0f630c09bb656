//! Local archive tree.
//!
//! Walks a directory recursively using `tokio::fs` and collects every archive
//! found below it, however deeply nested.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};
use tracing::instrument;
use zimsync_archive::ArchiveSet;

pub type PathStream<'a> = Pin<Box<dyn Stream<Item = Result<PathBuf>> + Send + 'a>>;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// A directory holding local archives.
///
/// # Examples
///
/// ```no_run
/// use zimsync_listing::LocalTree;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tree = LocalTree::new("/srv/zim")?;
/// let archives = tree.archives("zim").await;
/// println!("{} archives on disk", archives.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    /// Open an existing directory. Unlike a download destination, the
    /// repository is never created on the fly: a missing directory usually
    /// means an unmounted volume.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&root).map_err(|e| map_io_error(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stream the path of every regular file below the root.
    ///
    /// Symlinks to files are followed; symlinks to directories are not, which
    /// keeps the walk finite. Unreadable directories are yielded as errors
    /// without ending the stream.
    pub fn list_stream(&self) -> PathStream<'_> {
        let mut stack = vec![self.root.clone()];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) => {
                        yield Err(exn::Exn::from(map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(map_io_error(e, &current))); continue 'entries; },
                    };
                    match process_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    /// Collect every archive below the root.
    ///
    /// Best effort: walk errors and unparsable archive names are logged and
    /// skipped.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn archives(&self, extension: &str) -> ArchiveSet {
        let paths: Vec<PathBuf> = self
            .list_stream()
            .filter_map(|entry| async move {
                entry.inspect_err(|e| tracing::warn!(error = ?e, "Skipping unreadable entry")).ok()
            })
            .collect()
            .await;
        let archives = ArchiveSet::from_paths(&paths, extension);
        tracing::debug!(files = paths.len(), archives = archives.len(), "Scanned local tree");
        archives
    }
}

async fn process_entry(entry: DirEntry) -> Result<WalkEntry> {
    let path = entry.path();
    let file_type = entry.file_type().await.map_err(|e| map_io_error(e, &path))?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if file_type.is_file() {
        return Ok(WalkEntry::File(path));
    }
    if file_type.is_symlink() {
        return Ok(match fs::metadata(&path).await {
            Ok(target) if target.is_file() => WalkEntry::File(path),
            // Note: silently drop broken symlinks and links to directories.
            _ => WalkEntry::Skip,
        });
    }
    Ok(WalkEntry::Skip)
}

pub(crate) fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::fs::{create_dir_all, write};

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            create_dir_all(parent).unwrap();
        }
        write(path, b"").unwrap();
    }

    #[test]
    fn test_new_requires_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalTree::new(temp_dir.path()).is_ok());
        touch(temp_dir.path(), "file.zim");
        let err = LocalTree::new(temp_dir.path().join("file.zim")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        let err = LocalTree::new(temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_recursive() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "a.zim");
        touch(temp_dir.path(), "wikipedia/b.zim");
        touch(temp_dir.path(), "wikipedia/deep/er/c.txt");
        let tree = LocalTree::new(temp_dir.path()).unwrap();
        let mut files: Vec<PathBuf> = tree.list_stream().try_collect().await.unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                temp_dir.path().join("a.zim"),
                temp_dir.path().join("wikipedia/b.zim"),
                temp_dir.path().join("wikipedia/deep/er/c.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tree = LocalTree::new(temp_dir.path()).unwrap();
        let files: Vec<PathBuf> = tree.list_stream().try_collect().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_archives() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "wikipedia_en_all_nopic_2020-03.zim");
        touch(temp_dir.path(), "wikipedia/wikipedia_en_all_nopic_2020-06.zim");
        touch(temp_dir.path(), "wikipedia/wikipedia_en_all_nopic_2020-06.zim.part");
        touch(temp_dir.path(), "broken.zim");
        touch(temp_dir.path(), "README.md");
        let tree = LocalTree::new(temp_dir.path()).unwrap();
        let archives = tree.archives("zim").await;
        let stems: Vec<_> = archives.iter().map(|a| a.full_identifier()).collect();
        assert_eq!(stems, vec!["wikipedia_en_all_nopic_2020-03", "wikipedia_en_all_nopic_2020-06"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        touch(outside.path(), "wikipedia_en_all_nopic_2020-06.zim");
        std::os::unix::fs::symlink(
            outside.path().join("wikipedia_en_all_nopic_2020-06.zim"),
            temp_dir.path().join("wikipedia_en_all_nopic_2020-06.zim"),
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("gone.zim"), temp_dir.path().join("dangling.zim")).unwrap();
        let tree = LocalTree::new(temp_dir.path()).unwrap();
        let files: Vec<PathBuf> = tree.list_stream().try_collect().await.unwrap();
        assert_eq!(files, vec![temp_dir.path().join("wikipedia_en_all_nopic_2020-06.zim")]);
    }
}
