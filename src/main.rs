mod cli;
mod error;
mod logging;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use zimsync_archive::Library;
use zimsync_client::{ClientHandle, DryRunClient, TransmissionClient};
use zimsync_config::Config;
use zimsync_listing::remote::{CachedLister, CommandLister};
use zimsync_listing::{ListerHandle, LocalTree};
use zimsync_sync::{Context, Summary, SyncEvent, sync};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_level());

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Synchronization aborted");
            ExitCode::from(e.exit_code())
        },
    }
}

async fn run(cli: Cli) -> Result<Summary> {
    let (library, repository) = inputs(&cli).await?;

    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    cli.apply(&mut config);
    let lister = remote_lister(&config);
    let client = download_client(&config, cli.dry_run)?;

    let ctx = Context {
        library,
        repository,
        extension: config.server.extension,
        server: config.server.url,
        keep: config.retention.keep,
        concurrency: config.concurrency,
    };
    tracing::info!(
        names = ctx.library.len(),
        repository = %ctx.repository.display(),
        keep = ctx.keep,
        dry_run = cli.dry_run,
        "Synchronizing"
    );
    drive(&ctx, &lister, &client).await
}

/// Read the library file and resolve the repository directory.
async fn inputs(cli: &Cli) -> Result<(Library, PathBuf)> {
    let text = tokio::fs::read_to_string(&cli.library).await.or_raise(|| ErrorKind::Library(cli.library.clone()))?;
    let library = Library::from_iter(text.lines());
    if library.is_empty() {
        tracing::warn!(library = %cli.library.display(), "Library lists no archive names");
    }

    // Transmission resolves relative download directories against its own working directory.
    let repository = tokio::fs::canonicalize(&cli.repository)
        .await
        .or_raise(|| ErrorKind::Repository(cli.repository.clone()))?;
    LocalTree::new(&repository).or_raise(|| ErrorKind::Repository(cli.repository.clone()))?;
    Ok((library, repository))
}

/// Consume the sync stream. Only an unreadable repository is fatal.
async fn drive(ctx: &Context, lister: &ListerHandle, client: &ClientHandle) -> Result<Summary> {
    let mut summary = Summary::default();
    let mut events = std::pin::pin!(sync(ctx, lister, client));
    while let Some(event) = events.next().await {
        match event {
            Ok(SyncEvent::Complete(complete)) => {
                tracing::info!(
                    removed = complete.removed,
                    added = complete.added,
                    skipped = complete.skipped,
                    up_to_date = complete.up_to_date,
                    unavailable = complete.unavailable,
                    failed = complete.failed,
                    "Synchronization complete"
                );
                summary = complete;
            },
            Ok(event) => tracing::trace!(?event, "Sync progress"),
            Err(e) if matches!(&*e, zimsync_sync::error::ErrorKind::Scan) => {
                return Err(e).or_raise(|| ErrorKind::Repository(ctx.repository.clone()));
            },
            // Per-archive failures are reported and never change the exit status.
            Err(e) => tracing::error!(error = ?e, "Client request failed"),
        }
    }
    Ok(summary)
}

fn remote_lister(config: &Config) -> ListerHandle {
    let command: ListerHandle = Arc::new(CommandLister::new(&config.remote.command));
    match &config.remote.cache {
        Some(cache) => Arc::new(CachedLister::new(command, cache).persist(config.remote.persist_cache)),
        None => command,
    }
}

fn download_client(config: &Config, dry_run: bool) -> Result<ClientHandle> {
    let settings = &config.transmission;
    let mut transmission = TransmissionClient::new(settings.endpoint(), settings.request_timeout())
        .or_raise(|| ErrorKind::Setup("download client"))?;
    if let Some(username) = &settings.username {
        transmission = transmission.with_credentials(username, settings.password.clone().unwrap_or_default());
    }
    let client: ClientHandle = Arc::new(transmission);
    Ok(if dry_run { Arc::new(DryRunClient::new(client)) } else { client })
}
