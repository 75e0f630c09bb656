//! Retention planning for superseded local archives.
//!
//! Deletion is purely a local-redundancy concern: it never looks at the remote
//! listing, and the newest local copy of an archive is never a candidate,
//! even when a newer publication exists upstream.

use crate::identity::ArchiveIdentity;
use crate::library::Library;
use crate::set::ArchiveSet;
use std::collections::BTreeSet;

/// Select the local archives that can be deleted.
///
/// For each library name, every version except the newest is a "former"
/// version. The `keep` most recent former versions are retained as a safety
/// margin; the remaining (oldest) ones are returned. `keep = 0` selects every
/// former version.
///
/// ```
/// use zimsync_archive::{ArchiveIdentity, ArchiveSet, Library, plan_retention};
///
/// let local: ArchiveSet = ["x_en_all_2020-01", "x_en_all_2020-03", "x_en_all_2020-06"]
///     .into_iter()
///     .map(|s| ArchiveIdentity::parse(s).unwrap())
///     .collect();
/// let library = Library::from_iter(["x_en_all"]);
///
/// let delete = plan_retention(&library, &local, 1);
/// let delete: Vec<_> = delete.iter().map(|a| a.full_identifier()).collect();
/// assert_eq!(delete, vec!["x_en_all_2020-01"]);
/// ```
pub fn plan_retention(library: &Library, local: &ArchiveSet, keep: usize) -> BTreeSet<ArchiveIdentity> {
    let mut obsolete = BTreeSet::new();
    for name in library.iter() {
        let versions: Vec<&ArchiveIdentity> = local.versions_of(name).collect();
        let Some((_current, former)) = versions.split_last() else {
            continue;
        };
        // `former` is ascending: the oldest copies come first and go first.
        let excess = former.len().saturating_sub(keep);
        obsolete.extend(former[..excess].iter().map(|archive| (*archive).clone()));
    }
    obsolete
}
