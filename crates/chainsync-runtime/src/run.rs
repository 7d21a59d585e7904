//! Daemon run path: wires the relay watcher, ticket pool, and state
//! store into the synchronizer, then holds until a shutdown signal.

use std::sync::Arc;

use chainsync_engine::{StateStore, Synchronizer, TicketPool};
use tracing::info;

use crate::config::DaemonConfig;
use crate::pool::InMemoryTicketPool;
use crate::store::JsonlStateStore;

/// Run the daemon: start the sync pipelines, wait for ctrl-c or
/// SIGTERM, then join every pipeline task before returning.
pub async fn run_daemon(config: DaemonConfig) -> anyhow::Result<()> {
    let store = JsonlStateStore::open(&config.store.path)
        .map_err(|e| anyhow::anyhow!("cannot open state store {}: {e}", config.store.path.display()))?;
    info!(path = %store.path().display(), "state store open");
    let pool = Arc::new(InMemoryTicketPool::new());

    let mut sync = Synchronizer::new(
        config.sync_config(),
        Arc::new(config.relay_watcher()),
        Arc::clone(&pool) as Arc<dyn TicketPool>,
        Arc::new(store) as Arc<dyn StateStore>,
    );
    sync.start()?;

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("received ctrl-c, shutting down");
        }
    }

    sync.stop().await;
    info!(pooled = pool.len(), "daemon stopped");
    Ok(())
}
