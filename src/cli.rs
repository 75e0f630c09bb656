use clap::{ArgAction, Parser};
use std::path::PathBuf;
use zimsync_config::Config;

/// Mirror the newest Kiwix archives of a library through a BitTorrent client.
///
/// Former versions beyond the retention margin are removed from the client
/// (data included), then the newest publication of every library name that
/// is missing locally is queued for download into the repository.
#[derive(Debug, Parser)]
#[command(name = "zimsync", version)]
pub struct Cli {
    /// File listing the archive names to mirror, one per line.
    pub library: PathBuf,
    /// Directory holding the local archives; downloads land here too.
    pub repository: PathBuf,
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Former versions to keep next to the newest local copy.
    #[arg(long, short = 'k')]
    pub keep: Option<usize>,
    /// Remote listing cache file, used as-is when present.
    #[arg(long, conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,
    /// Always ask the remote server, ignoring any listing cache.
    #[arg(long)]
    pub no_cache: bool,
    /// Log what would be added and removed without telling the client.
    #[arg(long, short = 'n')]
    pub dry_run: bool,
    /// More logging (repeatable).
    #[arg(long, short = 'v', action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Less logging (repeatable).
    #[arg(long, short = 'q', action = ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Override configuration values given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(keep) = self.keep {
            config.retention.keep = keep;
        }
        if let Some(cache) = &self.cache {
            config.remote.cache = Some(cache.clone());
        }
        if self.no_cache {
            config.remote.cache = None;
        }
    }

    /// Default log level, before `ZIMSYNC_LOG` or `RUST_LOG` are considered.
    pub fn log_level(&self) -> &'static str {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            ..=-2 => "error",
            -1 => "warn",
            0 => "info",
            1 => "debug",
            2.. => "trace",
        }
    }
}
