use std::fmt::{Display, Formatter, Result as FmtResult};
use zimsync_archive::{ArchiveIdentity, Location};

/// Location of the `.torrent` file describing a published archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TorrentRef(String);

impl TorrentRef {
    /// Derive the torrent URL of a remote archive.
    ///
    /// The publication server keeps a `.torrent` next to every archive, so
    /// the URL is the archive's server path with `.torrent` appended.
    ///
    /// ```
    /// use zimsync_archive::ArchiveIdentity;
    /// use zimsync_client::TorrentRef;
    ///
    /// let archive = ArchiveIdentity::from_remote_path("wikipedia/wikipedia_en_all_nopic_2020-06.zim", "zim").unwrap();
    /// let torrent = TorrentRef::for_archive("https://download.kiwix.org/zim/", &archive, "zim");
    /// assert_eq!(
    ///     torrent.as_str(),
    ///     "https://download.kiwix.org/zim/wikipedia/wikipedia_en_all_nopic_2020-06.zim.torrent"
    /// );
    /// ```
    pub fn for_archive(server: &str, archive: &ArchiveIdentity, extension: &str) -> Self {
        let server = server.trim_end_matches('/');
        let file_name = archive.file_name(extension);
        Self(match archive.location() {
            Some(Location::Remote(directory)) => format!("{server}/{directory}/{file_name}.torrent"),
            // Local archives have no server directory; assume the server root.
            _ => format!("{server}/{file_name}.torrent"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TorrentRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for TorrentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
