use crate::error::{ErrorKind, Result};
use crate::event::{Summary, SyncEvent};
use crate::Context;
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::future::Future;
use tracing::instrument;
use zimsync_archive::{ArchiveIdentity, ArchiveSet, plan_retention, reconcile};
use zimsync_client::{Added, ClientHandle, Removed, TorrentRef};
use zimsync_listing::{ListerHandle, LocalTree};

/// Streams [`SyncEvent`]s while bringing the repository in line with the
/// library.
///
/// The run goes through its phases strictly in order:
///
/// 1. scan the repository,
/// 2. ask the client to delete former versions beyond `ctx.keep`,
/// 3. rescan once every removal has completed,
/// 4. list the remote server (an unreachable server counts as publishing
///    nothing),
/// 5. reconcile, and queue the newest publication of every name that needs it.
///
/// Client requests within a phase run concurrently, at most
/// `ctx.concurrency` at a time. A failed request is yielded as an `Err` item
/// and the run carries on with the next one.
pub fn sync<'a>(
    ctx: &'a Context,
    lister: &'a ListerHandle,
    client: &'a ClientHandle,
) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(SyncEvent::Started);

        let tree = match LocalTree::new(&ctx.repository).or_raise(|| ErrorKind::Scan) {
            Ok(tree) => tree,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut summary = Summary::default();

        let local = tree.archives(&ctx.extension).await;
        yield Ok(SyncEvent::LocalScanned(local.len()));

        let removals: Vec<_> = plan_retention(&ctx.library, &local, ctx.keep)
            .into_iter()
            .map(|archive| remove(client, ctx, archive))
            .collect();
        for await result in bounded(removals, ctx.concurrency) {
            match &result {
                Ok(SyncEvent::Removed { outcome: Removed::Deleted, .. }) => summary.removed += 1,
                Ok(_) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
            yield result;
        }

        let local = tree.archives(&ctx.extension).await;
        yield Ok(SyncEvent::Rescanned(local.len()));

        let remote = match lister.list().await {
            Ok(listing) => ArchiveSet::from_remote_listing(&listing, &ctx.extension),
            Err(e) => {
                tracing::warn!(lister = lister.name(), error = ?e, "Remote listing unavailable, treating as empty");
                ArchiveSet::default()
            },
        };
        yield Ok(SyncEvent::RemoteListed(remote.len()));

        let plan = reconcile(&ctx.library, &local, &remote);
        for stale in &plan.stale {
            tracing::info!(local = %stale.local, latest = %stale.latest, "Newer version published");
        }
        for name in plan.unavailable {
            tracing::warn!(name, "Not published by the remote server");
            summary.unavailable += 1;
            yield Ok(SyncEvent::Unavailable(name));
        }
        for name in plan.current {
            tracing::debug!(name, "Up to date");
            summary.up_to_date += 1;
            yield Ok(SyncEvent::UpToDate(name));
        }

        let additions: Vec<_> = plan.fetch.into_values().map(|archive| add(client, ctx, archive)).collect();
        for await result in bounded(additions, ctx.concurrency) {
            match &result {
                Ok(SyncEvent::Added { outcome: Added::Queued, .. }) => summary.added += 1,
                Ok(_) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
            yield result;
        }

        yield Ok(SyncEvent::Complete(summary));
    })
}

/// Drives `futures` with at most `limit` in flight, yielding each output as it
/// completes.
fn bounded<F: Future>(futures: Vec<F>, limit: usize) -> impl Stream<Item = F::Output> {
    let mut pending = VecDeque::from(futures);
    stream!({
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.drain(..limit.max(1).min(pending.len())));
        while let Some(output) = processing.next().await {
            yield output;
            // Pop-n-push, but FIFO instead of LIFO.
            if let Some(next) = pending.pop_front() {
                processing.push(next);
            }
        }
    })
}

#[instrument(skip_all, fields(archive = %archive))]
async fn remove(client: &ClientHandle, ctx: &Context, archive: ArchiveIdentity) -> Result<SyncEvent> {
    let name = archive.file_name(&ctx.extension);
    let outcome = client.remove(&name).await.or_raise(|| ErrorKind::Remove(name.clone()))?;
    match outcome {
        Removed::Deleted => tracing::info!("Former version removed"),
        outcome => tracing::debug!(?outcome, "Former version left in place"),
    }
    Ok(SyncEvent::Removed { archive, outcome })
}

#[instrument(skip_all, fields(archive = %archive))]
async fn add(client: &ClientHandle, ctx: &Context, archive: ArchiveIdentity) -> Result<SyncEvent> {
    let torrent = TorrentRef::for_archive(&ctx.server, &archive, &ctx.extension);
    let outcome = client
        .add(&torrent, &ctx.repository)
        .await
        .or_raise(|| ErrorKind::Add(archive.name().to_string()))?;
    match outcome {
        Added::Queued => tracing::info!(%torrent, "Download queued"),
        outcome => tracing::debug!(%torrent, ?outcome, "Download not queued"),
    }
    Ok(SyncEvent::Added { archive, torrent, outcome })
}
