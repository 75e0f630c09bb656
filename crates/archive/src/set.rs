use crate::error::ErrorKind;
use crate::identity::ArchiveIdentity;
use crate::library::Library;
use std::collections::BTreeSet;
use std::collections::btree_set::Iter;
use std::path::Path;

/// A collection of archives without duplicate full identifiers.
///
/// Iteration is ordered by full identifier, so entries sharing a logical name
/// are adjacent and in ascending version order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSet {
    archives: BTreeSet<ArchiveIdentity>,
}

impl ArchiveSet {
    /// Build a set from local file paths.
    ///
    /// Paths without the archive extension are ignored. Paths that look like
    /// archives but cannot be parsed are logged and skipped; they never abort
    /// the scan.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>, extension: &str) -> Self {
        let mut set = Self::default();
        for path in paths {
            let path = path.as_ref();
            match ArchiveIdentity::from_local_path(path, extension) {
                Ok(archive) => {
                    set.insert(archive);
                },
                Err(e) if matches!(&*e, ErrorKind::Extension { .. }) => {},
                Err(e) => tracing::warn!(path = %path.display(), error = ?e, "Skipping unparsable archive"),
            }
        }
        set
    }

    /// Build a set from a raw remote listing, one entry per line.
    ///
    /// Only the last whitespace-separated token of a line is considered, which
    /// accepts both bare paths and `rsync --list-only` output. Anything that
    /// isn't a parsable archive is skipped silently: listings routinely
    /// contain other files.
    ///
    /// ```
    /// use zimsync_archive::ArchiveSet;
    ///
    /// let listing = "\
    /// drwxr-xr-x          4,096 2020/06/01 10:00:00 wikipedia
    /// -rw-r--r--  2,345,678,901 2020/06/01 10:00:00 wikipedia/wikipedia_en_all_nopic_2020-06.zim
    /// wikipedia/wikipedia_en_all_nopic_2020-03.zim
    /// wikipedia/README
    /// ";
    /// let set = ArchiveSet::from_remote_listing(listing, "zim");
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn from_remote_listing(listing: &str, extension: &str) -> Self {
        listing
            .lines()
            .filter_map(|line| line.split_whitespace().last())
            .filter_map(|path| ArchiveIdentity::from_remote_path(path, extension).ok())
            .collect()
    }

    /// Insert an archive. Returns `false` (keeping the existing entry) if an
    /// archive with the same full identifier is already present.
    pub fn insert(&mut self, archive: ArchiveIdentity) -> bool {
        self.archives.insert(archive)
    }

    pub fn contains(&self, archive: &ArchiveIdentity) -> bool {
        self.archives.contains(archive)
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, ArchiveIdentity> {
        self.archives.iter()
    }

    /// Subset of archives whose logical name belongs to the library.
    pub fn restrict(&self, library: &Library) -> Self {
        self.iter().filter(|archive| library.contains(archive.name())).cloned().collect()
    }

    /// All archives of one logical name, ascending by version.
    pub fn versions_of<'a>(&'a self, name: &str) -> impl DoubleEndedIterator<Item = &'a ArchiveIdentity> {
        self.iter().filter(move |archive| archive.name() == name)
    }

    /// Newest archive of one logical name.
    pub fn latest(&self, name: &str) -> Option<&ArchiveIdentity> {
        self.versions_of(name).next_back()
    }
}

impl FromIterator<ArchiveIdentity> for ArchiveSet {
    fn from_iter<I: IntoIterator<Item = ArchiveIdentity>>(iter: I) -> Self {
        let mut set = Self::default();
        for archive in iter {
            set.insert(archive);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ArchiveSet {
    type Item = &'a ArchiveIdentity;
    type IntoIter = Iter<'a, ArchiveIdentity>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
