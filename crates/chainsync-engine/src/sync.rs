//! Synchronization lifecycle controller.

use std::sync::Arc;

use chainsync_core::config::SyncConfig;
use chainsync_core::types::{AccountMapping, EventKind, Ticket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::dispatch;
use crate::error::StartError;
use crate::merge::merge;
use crate::traits::{ChainWatcher, StateStore, TicketPool};
use crate::watch::{spawn_mapping_source, spawn_ticket_sources};

/// Concurrent multi-chain event synchronizer.
///
/// Owns the cancellation token and every pipeline task. `start`
/// launches the ticket pipeline (one source per configured network,
/// fan-in merged) and the account-mapping pipeline (single factory
/// source); `stop` cancels and joins them all before returning. One
/// controller serves one process run; there is no restart.
pub struct Synchronizer<W: ChainWatcher> {
    cfg: SyncConfig,
    watcher: Arc<W>,
    pool: Arc<dyn TicketPool>,
    state: Arc<dyn StateStore>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    started: bool,
}

impl<W: ChainWatcher> Synchronizer<W> {
    pub fn new(
        cfg: SyncConfig,
        watcher: Arc<W>,
        pool: Arc<dyn TicketPool>,
        state: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            cfg,
            watcher,
            pool,
            state,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            started: false,
        }
    }

    /// Launch every pipeline. Non-blocking: returns once the tasks are
    /// spawned. Fails only on invalid configuration, double start, or a
    /// controller that has already been stopped; never because an
    /// upstream is unreachable (that surfaces as a logged per-source
    /// failure instead).
    pub fn start(&mut self) -> Result<(), StartError> {
        // Pipelines spawned on a cancelled token would all exit at once.
        if self.cancel.is_cancelled() {
            return Err(StartError::Stopped);
        }
        if self.started {
            return Err(StartError::AlreadyStarted);
        }
        self.cfg.validate()?;

        info!(
            networks = self.cfg.networks.len(),
            queue_capacity = self.cfg.queue_capacity,
            persist_tickets = self.cfg.persist_tickets,
            "sync starting"
        );
        self.spawn_ticket_pipeline();
        self.spawn_mapping_pipeline();
        self.started = true;
        Ok(())
    }

    /// Fire cancellation and wait for every pipeline task to exit.
    ///
    /// Blocks until the task set is fully drained, so once this
    /// returns no source, forwarder, or dispatch task is still running
    /// and no further apply can occur. Idempotent: later calls find
    /// the set already drained and return immediately.
    pub async fn stop(&mut self) {
        info!("sync stopping");
        self.cancel.cancel();
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "pipeline task ended abnormally during shutdown");
            }
        }
        info!("sync stopped");
    }

    fn spawn_ticket_pipeline(&mut self) {
        let queues = spawn_ticket_sources(
            &mut self.tasks,
            &self.watcher,
            &self.cfg.networks,
            &self.cancel,
            self.cfg.queue_capacity,
        );
        let merged = merge(&mut self.tasks, &self.cancel, queues, self.cfg.queue_capacity);

        let pool = Arc::clone(&self.pool);
        let state = Arc::clone(&self.state);
        let persist = self.cfg.persist_tickets;
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            dispatch(EventKind::Ticket, cancel, merged, move |ticket: Ticket| {
                if persist && let Err(e) = state.add_ticket(&ticket) {
                    // Pool insert still goes ahead; durability is best-effort
                    // when the store misbehaves.
                    warn!(
                        chain = %ticket.chain_id,
                        tx_hash = %ticket.tx_hash,
                        error = %e,
                        "ticket store write failed"
                    );
                }
                debug!(
                    chain = %ticket.chain_id,
                    tx_hash = %ticket.tx_hash,
                    "synchronizing new ticket"
                );
                pool.add_ticket(ticket)
            })
            .await;
        });
    }

    fn spawn_mapping_pipeline(&mut self) {
        let queue = spawn_mapping_source(
            &mut self.tasks,
            &self.watcher,
            self.cfg.factory.start_cursor,
            &self.cancel,
            self.cfg.queue_capacity,
        );

        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            dispatch(
                EventKind::AccountMapping,
                cancel,
                queue,
                move |mapping: AccountMapping| {
                    debug!(
                        user = %mapping.user,
                        account = %mapping.account,
                        "synchronizing new account mapping"
                    );
                    state.add_mapping(mapping)
                },
            )
            .await;
        });
    }
}
