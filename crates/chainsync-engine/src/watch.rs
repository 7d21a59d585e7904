//! Source adapter harness: one task per configured source.

use std::sync::Arc;

use chainsync_core::config::NetworkConfig;
use chainsync_core::types::{AccountMapping, Ticket};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::traits::ChainWatcher;

/// Spawn one ticket watch per network; returns one queue per source.
///
/// The harness task owns the sending half of its queue, so the queue
/// closes when the watch ends, however it ends. A watch that returns
/// an error is logged with the chain identity and contained there:
/// sibling sources and other pipelines never see it.
pub(crate) fn spawn_ticket_sources<W: ChainWatcher>(
    tasks: &mut JoinSet<()>,
    watcher: &Arc<W>,
    networks: &[NetworkConfig],
    cancel: &CancellationToken,
    capacity: usize,
) -> Vec<mpsc::Receiver<Ticket>> {
    let mut queues = Vec::with_capacity(networks.len());
    for network in networks {
        let (tx, rx) = mpsc::channel(capacity);
        queues.push(rx);

        let watcher = Arc::clone(watcher);
        let cancel = cancel.clone();
        let chain = network.chain_id;
        let from = network.start_cursor;
        tasks.spawn(async move {
            info!(chain = %chain, from, "ticket source starting");
            if let Err(e) = watcher.watch_tickets(chain, from, cancel, tx).await {
                error!(chain = %chain, error = %e, "ticket source terminated");
            }
        });
    }
    queues
}

/// Spawn the single account factory watch.
pub(crate) fn spawn_mapping_source<W: ChainWatcher>(
    tasks: &mut JoinSet<()>,
    watcher: &Arc<W>,
    from: u64,
    cancel: &CancellationToken,
    capacity: usize,
) -> mpsc::Receiver<AccountMapping> {
    let (tx, rx) = mpsc::channel(capacity);

    let watcher = Arc::clone(watcher);
    let cancel = cancel.clone();
    tasks.spawn(async move {
        info!(from, "account factory source starting");
        if let Err(e) = watcher.watch_mappings(from, cancel, tx).await {
            error!(error = %e, "account factory source terminated");
        }
    });
    rx
}
