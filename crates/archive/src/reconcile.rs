//! Reconciliation of local archives against a remote publication listing.

use crate::identity::ArchiveIdentity;
use crate::library::Library;
use crate::set::ArchiveSet;
use std::collections::{BTreeMap, BTreeSet};

/// A local archive superseded by a newer remote publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stale {
    pub local: ArchiveIdentity,
    pub latest: ArchiveIdentity,
}

/// Outcome of comparing local and remote archives for every library name.
///
/// Nothing here references the download client: turning a
/// [`fetch`](Self::fetch) entry into a torrent reference happens at the client
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Newest remote archive for names with no local copy at all.
    pub missing: BTreeSet<ArchiveIdentity>,
    /// Local archives older than the newest remote publication of their name,
    /// for names whose newest publication is not present locally.
    pub stale: Vec<Stale>,
    /// One archive to retrieve per logical name needing action.
    pub fetch: BTreeMap<String, ArchiveIdentity>,
    /// Names whose newest remote publication is already present locally.
    pub current: BTreeSet<String>,
    /// Library names the remote listing does not publish at all.
    pub unavailable: BTreeSet<String>,
}

impl Reconciliation {
    /// `true` when nothing needs to be fetched.
    pub fn is_up_to_date(&self) -> bool {
        self.fetch.is_empty()
    }
}

/// Decide which archives to fetch so that local storage holds the newest
/// remote publication of every library name.
///
/// Pure and idempotent: the same inputs always produce the same plan.
///
/// ```
/// use zimsync_archive::{ArchiveIdentity, ArchiveSet, Library, reconcile};
///
/// let set = |stems: &[&str]| -> ArchiveSet {
///     stems.iter().map(|s| ArchiveIdentity::parse(*s).unwrap()).collect()
/// };
/// let library = Library::from_iter(["wikipedia_en_all_nopic"]);
/// let remote = set(&["wikipedia_en_all_nopic_2020-03", "wikipedia_en_all_nopic_2020-06"]);
/// let local = set(&["wikipedia_en_all_nopic_2020-03"]);
///
/// let plan = reconcile(&library, &local, &remote);
/// assert_eq!(plan.fetch["wikipedia_en_all_nopic"].version().as_str(), "2020-06");
/// ```
pub fn reconcile(library: &Library, local: &ArchiveSet, remote: &ArchiveSet) -> Reconciliation {
    let local = local.restrict(library);
    let remote = remote.restrict(library);
    let mut plan = Reconciliation::default();

    for name in library.iter() {
        let Some(latest) = remote.latest(name) else {
            plan.unavailable.insert(name.to_string());
            continue;
        };
        let mut present = local.versions_of(name).peekable();
        if present.peek().is_none() {
            plan.missing.insert(latest.clone());
            plan.fetch.insert(name.to_string(), latest.clone());
            continue;
        }
        if local.contains(latest) {
            plan.current.insert(name.to_string());
            continue;
        }
        // Local copies exist, but not the newest one: however many older
        // copies there are, the newest publication must still be fetched.
        plan.stale.extend(present.filter(|archive| archive.version() < latest.version()).map(|archive| Stale {
            local: archive.clone(),
            latest: latest.clone(),
        }));
        plan.fetch.insert(name.to_string(), latest.clone());
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(stems: &[&str]) -> ArchiveSet {
        stems.iter().map(|stem| ArchiveIdentity::parse(*stem).unwrap()).collect()
    }

    fn library(names: &[&str]) -> Library {
        Library::from_iter(names)
    }

    #[test]
    fn test_fetches_newer_remote_version() {
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &set(&["wikipedia_en_all_nopic_2020-03"]),
            &set(&["wikipedia_en_all_nopic_2020-03", "wikipedia_en_all_nopic_2020-06"]),
        );
        assert_eq!(plan.fetch.len(), 1);
        assert_eq!(plan.fetch["wikipedia_en_all_nopic"].full_identifier(), "wikipedia_en_all_nopic_2020-06");
        assert!(plan.missing.is_empty());
        assert_eq!(
            plan.stale,
            vec![Stale {
                local: ArchiveIdentity::parse("wikipedia_en_all_nopic_2020-03").unwrap(),
                latest: ArchiveIdentity::parse("wikipedia_en_all_nopic_2020-06").unwrap(),
            }]
        );
    }

    #[test]
    fn test_fetches_missing_archive() {
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &ArchiveSet::default(),
            &set(&["wikipedia_en_all_nopic_2020-03", "wikipedia_en_all_nopic_2020-06"]),
        );
        let latest = ArchiveIdentity::parse("wikipedia_en_all_nopic_2020-06").unwrap();
        assert_eq!(plan.missing, BTreeSet::from([latest.clone()]));
        assert_eq!(plan.fetch["wikipedia_en_all_nopic"], latest);
        assert!(plan.stale.is_empty());
    }

    #[test]
    fn test_current_when_latest_present_among_older_copies() {
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &set(&["wikipedia_en_all_nopic_2020-01", "wikipedia_en_all_nopic_2020-06"]),
            &set(&["wikipedia_en_all_nopic_2020-03", "wikipedia_en_all_nopic_2020-06"]),
        );
        assert!(plan.is_up_to_date());
        assert_eq!(plan.current, BTreeSet::from(["wikipedia_en_all_nopic".to_string()]));
    }

    #[test]
    fn test_fetch_even_with_many_older_local_copies() {
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &set(&["wikipedia_en_all_nopic_2019-12", "wikipedia_en_all_nopic_2020-01", "wikipedia_en_all_nopic_2020-03"]),
            &set(&["wikipedia_en_all_nopic_2020-06"]),
        );
        assert_eq!(plan.fetch["wikipedia_en_all_nopic"].version().as_str(), "2020-06");
        assert_eq!(plan.stale.len(), 3);
    }

    #[test]
    fn test_local_newer_than_remote_is_not_stale() {
        // A mirror lagging behind what is already on disk still gets asked
        // for its own newest version, but nothing local is flagged as stale.
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &set(&["wikipedia_en_all_nopic_2020-09"]),
            &set(&["wikipedia_en_all_nopic_2020-06"]),
        );
        assert!(plan.stale.is_empty());
        assert_eq!(plan.fetch["wikipedia_en_all_nopic"].version().as_str(), "2020-06");
    }

    #[rstest]
    #[case::empty_remote(&[])]
    #[case::other_archives(&["wiktionary_fr_all_maxi_2020-06"])]
    fn test_unavailable_remote(#[case] remote: &[&str]) {
        let plan = reconcile(&library(&["wikipedia_en_all_nopic"]), &set(&["wikipedia_en_all_nopic_2020-03"]), &set(remote));
        assert!(plan.missing.is_empty());
        assert!(plan.fetch.is_empty());
        assert_eq!(plan.unavailable, BTreeSet::from(["wikipedia_en_all_nopic".to_string()]));
    }

    #[test]
    fn test_ignores_names_outside_library() {
        let plan = reconcile(
            &library(&["wikipedia_en_all_nopic"]),
            &ArchiveSet::default(),
            &set(&["wikipedia_en_all_nopic_2020-06", "wikipedia_en_all_maxi_2020-06"]),
        );
        assert_eq!(plan.fetch.keys().collect::<Vec<_>>(), vec!["wikipedia_en_all_nopic"]);
    }

    #[test]
    fn test_idempotent() {
        let library = library(&["wikipedia_en_all_nopic", "wiktionary_fr_all_maxi", "vikidia_fr_all_nopic"]);
        let local = set(&["wikipedia_en_all_nopic_2020-03", "wiktionary_fr_all_maxi_2020-06"]);
        let remote = set(&[
            "wikipedia_en_all_nopic_2020-03",
            "wikipedia_en_all_nopic_2020-06",
            "wiktionary_fr_all_maxi_2020-06",
            "vikidia_fr_all_nopic_2021-01",
        ]);
        let first = reconcile(&library, &local, &remote);
        let second = reconcile(&library, &local, &remote);
        assert_eq!(first, second);
        assert_eq!(first.fetch.len(), 2);
    }

    #[test]
    fn test_local_holds_every_maximum() {
        let library = library(&["wikipedia_en_all_nopic", "wiktionary_fr_all_maxi"]);
        let remote = set(&[
            "wikipedia_en_all_nopic_2020-03",
            "wikipedia_en_all_nopic_2020-06",
            "wiktionary_fr_all_maxi_2020-01",
            "wiktionary_fr_all_maxi_2020-06",
        ]);
        let local = set(&["wikipedia_en_all_nopic_2020-06", "wiktionary_fr_all_maxi_2020-06"]);
        assert!(reconcile(&library, &local, &remote).is_up_to_date());
    }
}
