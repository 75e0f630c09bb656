use crate::error::{Error, ErrorKind, Result};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Separates the segments of an archive name; the last segment is the version.
pub const DELIMITER: char = '_';

/// Where an archive was seen. Not part of an archive's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Directory on local storage containing the archive file.
    Local(PathBuf),
    /// Directory on the publication server, relative to the server root
    /// (e.g. `wikipedia`).
    Remote(String),
}

/// A publication token, compared as a plain string.
///
/// Kiwix publishes versions as `YYYY-MM` (or `YYYY-MM-DD`) which sort
/// correctly without any date parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version<'a>(&'a str);
impl<'a> Version<'a> {
    /// The raw version token, borrowed from the identity it came from.
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}
impl Display for Version<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.0)
    }
}

/// Kiwix naming scheme for the logical part of an archive name:
/// `website_lang_selection[_content]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameComponents<'a> {
    pub website: &'a str,
    pub lang: &'a str,
    pub selection: &'a str,
    /// Everything after the selection, which may itself contain delimiters.
    pub content: Option<&'a str>,
}

/// Version-aware identity of a single archive file.
///
/// Two identities are equal when their full identifiers (`name_version`) are
/// equal, regardless of where they were found. This lets local and remote
/// archives be compared as members of the same set.
#[derive(Debug, Clone)]
pub struct ArchiveIdentity {
    stem: String,
    /// Byte offset of the final delimiter within `stem`.
    split: usize,
    location: Option<Location>,
}

impl ArchiveIdentity {
    /// Parse a filename stem (no directory, no extension) into an identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use zimsync_archive::ArchiveIdentity;
    ///
    /// let archive = ArchiveIdentity::parse("wikipedia_en_all_nopic_2020-06").unwrap();
    /// assert_eq!(archive.name(), "wikipedia_en_all_nopic");
    /// assert_eq!(archive.version().as_str(), "2020-06");
    /// assert!(ArchiveIdentity::parse("README").is_err());
    /// ```
    pub fn parse(stem: impl Into<String>) -> Result<Self> {
        let stem = stem.into();
        let Some(split) = stem.rfind(DELIMITER) else {
            exn::bail!(ErrorKind::Parse(stem));
        };
        // Both sides must be non-empty: `_2020-06` and `wikipedia_` are junk.
        if split == 0 || split + DELIMITER.len_utf8() == stem.len() {
            exn::bail!(ErrorKind::Parse(stem));
        }
        Ok(Self { stem, split, location: None })
    }

    /// Parse a local file path such as `/srv/zim/wikipedia_en_all_nopic_2020-03.zim`.
    ///
    /// The parent directory becomes the [`Location::Local`] of the identity.
    pub fn from_local_path(path: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let path = path.as_ref();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            exn::bail!(ErrorKind::Parse(path.display().to_string()));
        };
        let identity = Self::parse(strip_extension(file_name, extension)?)?;
        Ok(match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                identity.with_location(Location::Local(parent.to_path_buf()))
            },
            _ => identity,
        })
    }

    /// Parse a server path such as `wikipedia/wikipedia_en_all_nopic_2020-03.zim`.
    ///
    /// The directory part becomes the [`Location::Remote`] of the identity.
    pub fn from_remote_path(path: &str, extension: &str) -> Result<Self> {
        let path = path.trim_start_matches("./");
        let (directory, file_name) = match path.rsplit_once('/') {
            Some((directory, file_name)) => (directory, file_name),
            None => ("", path),
        };
        let identity = Self::parse(strip_extension(file_name, extension)?)?;
        Ok(match directory.trim_matches('/') {
            "" => identity,
            directory => identity.with_location(Location::Remote(directory.to_string())),
        })
    }

    /// Record where this archive was found.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Logical name: stable across versions of the same archive.
    pub fn name(&self) -> &str {
        &self.stem[..self.split]
    }

    pub fn version(&self) -> Version<'_> {
        Version(&self.stem[self.split + DELIMITER.len_utf8()..])
    }

    /// `name_version`, the on-disk stem without extension.
    pub fn full_identifier(&self) -> &str {
        &self.stem
    }

    /// File name including the archive extension, as known to the download client.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.stem, extension)
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Split the logical name following the Kiwix naming scheme. Returns
    /// [`None`] for names with fewer than three segments.
    ///
    /// ```
    /// use zimsync_archive::ArchiveIdentity;
    ///
    /// let archive = ArchiveIdentity::parse("wikibooks_pt_all_nopic_2020-06").unwrap();
    /// let components = archive.components().unwrap();
    /// assert_eq!(components.website, "wikibooks");
    /// assert_eq!(components.content, Some("nopic"));
    /// ```
    pub fn components(&self) -> Option<NameComponents<'_>> {
        let mut segments = self.name().splitn(4, DELIMITER);
        let website = segments.next().filter(|s| !s.is_empty())?;
        let lang = segments.next().filter(|s| !s.is_empty())?;
        let selection = segments.next().filter(|s| !s.is_empty())?;
        let content = segments.next().filter(|s| !s.is_empty());
        Some(NameComponents { website, lang, selection, content })
    }
}

fn strip_extension<'a>(file_name: &'a str, extension: &str) -> Result<&'a str> {
    file_name
        .strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(|| {
            exn::Exn::from(ErrorKind::Extension {
                extension: extension.to_string(),
                name: file_name.to_string(),
            })
        })
}

impl PartialEq for ArchiveIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.stem == other.stem
    }
}
impl Eq for ArchiveIdentity {}
impl Hash for ArchiveIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stem.hash(state);
    }
}
impl Ord for ArchiveIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stem.cmp(&other.stem)
    }
}
impl PartialOrd for ArchiveIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ArchiveIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.stem)
    }
}

impl FromStr for ArchiveIdentity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
