//! Layered configuration for zimsync.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, chosen by extension),
//! 3. the legacy `TR_HOST`, `TR_PORT`, `TR_USER` and `TR_PASSWORD` variables,
//! 4. `ZIMSYNC_*` variables, with `__` separating nested keys
//!    (`ZIMSYNC_TRANSMISSION__HOST=nas.local`).

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zimsync_archive::DEFAULT_EXTENSION;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "kiwix";
const APPLICATION: &str = "zimsync";
const FILE_STEM: &str = "config";
const DEFAULT_SERVER: &str = "https://download.kiwix.org/zim";
const DEFAULT_CONCURRENCY: usize = 4;
const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];
const ENV_PREFIX: &str = "ZIMSYNC_";
const LEGACY_ENV: [(&str, &str); 4] = [
    ("TR_HOST", "transmission.host"),
    ("TR_PORT", "transmission.port"),
    ("TR_USER", "transmission.username"),
    ("TR_PASSWORD", "transmission.password"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub transmission: TransmissionConfig,
    pub retention: RetentionConfig,
    /// Maximum number of client requests in flight.
    pub concurrency: usize,
}

/// Where archives are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL that torrent paths are appended to.
    pub url: String,
    /// Archive file extension, without the dot.
    pub extension: String,
}

/// How the remote catalogue is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Program and arguments printing one archive path per line.
    pub command: Vec<String>,
    /// Listing cache, trusted as-is when present.
    pub cache: Option<PathBuf>,
    /// Write a fresh listing to the cache file.
    pub persist_cache: bool,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    pub host: String,
    pub port: u16,
    /// RPC path on the daemon.
    pub path: String,
    pub https: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout, in seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Number of former versions kept next to the newest local copy.
    pub keep: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            remote: RemoteConfig::default(),
            transmission: TransmissionConfig::default(),
            retention: RetentionConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            command: ["rsync", "--recursive", "--list-only", "download.kiwix.org::download.kiwix.org/zim/"]
                .map(str::to_string)
                .to_vec(),
            cache: Some(PathBuf::from("remote_zims.txt")),
            persist_cache: false,
        }
    }
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9091,
            path: "/transmission/rpc".to_string(),
            https: false,
            username: None,
            password: None,
            timeout: 30,
        }
    }
}

impl TransmissionConfig {
    /// Full URL of the RPC endpoint.
    pub fn endpoint(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        let path = self.path.trim_start_matches('/');
        format!("{scheme}://{}:{}/{path}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for TransmissionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransmissionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("https", &self.https)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// An `explicit` file must exist. Without one, the first
    /// `config.{toml,yaml,yml,json}` found in the platform configuration
    /// directory is used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(explicit)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// The merged configuration sources, before extraction.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match explicit {
            Some(path) if path.is_file() => Some(path.to_path_buf()),
            Some(path) => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            None => default_file(),
        };
        let figment = match file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Reading configuration file");
                merge_file(figment, &path)
            },
            None => figment,
        };
        Ok(figment.merge(legacy_env()).merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("server.url must not be empty".to_string()));
        }
        if self.server.extension.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("server.extension must not be empty".to_string()));
        }
        if self.remote.command.first().is_none_or(|program| program.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid("remote.command must name a program".to_string()));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

fn default_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)?;
    FILE_EXTENSIONS
        .iter()
        .map(|extension| dirs.config_dir().join(format!("{FILE_STEM}.{extension}")))
        .find(|path| path.is_file())
}

fn legacy_env() -> Env {
    Env::raw().only(&LEGACY_ENV.map(|(var, _)| var)).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
            .map(|(_, target)| (*target).into())
            .unwrap_or_else(|| key.into())
    })
}
