use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

/// The set of logical archive names that should be mirrored locally.
///
/// Read from a newline-delimited file; surrounding whitespace is ignored, as
/// are blank lines and `#` comments.
///
/// ```
/// use zimsync_archive::Library;
///
/// let library: Library = "wikipedia_en_all_nopic\n# comment\n\nwiktionary_fr_all_maxi\n".parse().unwrap();
/// assert_eq!(library.len(), 2);
/// assert!(library.contains("wiktionary_fr_all_maxi"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    names: BTreeSet<String>,
}

impl Library {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromStr for Library {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.lines().collect())
    }
}

impl<S: AsRef<str>> FromIterator<S> for Library {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref().trim();
                (!line.is_empty() && !line.starts_with('#')).then(|| line.to_string())
            })
            .collect();
        Self { names }
    }
}
