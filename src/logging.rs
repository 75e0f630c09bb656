//! Subscriber setup for the command-line binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, checked before `RUST_LOG`.
pub const FILTER_ENV: &str = "ZIMSYNC_LOG";

/// Initialize the tracing subscriber, writing to stderr.
///
/// The filter is read from `ZIMSYNC_LOG`, then `RUST_LOG`, and falls back to
/// `default_level` (which the `-v`/`-q` flags adjust):
///
/// ```bash
/// ZIMSYNC_LOG=debug zimsync library.txt /srv/zim
/// ZIMSYNC_LOG=zimsync_client=trace zimsync library.txt /srv/zim
/// ```
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
