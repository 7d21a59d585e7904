//! Capability seams between the synchronizer and its collaborators.
//! Implementations are injected at construction; the engine never
//! constructs one itself, which keeps every seam mock-injectable.

use std::future::Future;

use chainsync_core::error::{ApplyError, WatchError};
use chainsync_core::types::{AccountMapping, ChainId, Ticket};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Streaming watch over upstream chain events.
///
/// Both methods run until the upstream ends, an unrecoverable error
/// occurs, or `cancel` fires. Every send into `out` must race `cancel`
/// so a blocked hand-off unwinds promptly at shutdown; a send that
/// fails because the receiving side is gone is a cue to return, not an
/// error to surface.
pub trait ChainWatcher: Send + Sync + 'static {
    /// Stream entry point tickets for `chain` into `out`, starting at
    /// block cursor `from`.
    fn watch_tickets(
        &self,
        chain: ChainId,
        from: u64,
        cancel: CancellationToken,
        out: mpsc::Sender<Ticket>,
    ) -> impl Future<Output = Result<(), WatchError>> + Send;

    /// Stream account factory creation events into `out`, starting at
    /// block cursor `from`.
    fn watch_mappings(
        &self,
        from: u64,
        cancel: CancellationToken,
        out: mpsc::Sender<AccountMapping>,
    ) -> impl Future<Output = Result<(), WatchError>> + Send;
}

/// Downstream sink for tickets awaiting execution.
///
/// May be called concurrently from multiple pipelines; implementations
/// must be safe for concurrent use and tolerant of duplicate logical
/// events.
pub trait TicketPool: Send + Sync {
    fn add_ticket(&self, ticket: Ticket) -> Result<(), ApplyError>;
}

/// Durable record of synchronized chain state.
pub trait StateStore: Send + Sync {
    fn add_mapping(&self, mapping: AccountMapping) -> Result<(), ApplyError>;

    /// Only invoked when ticket persistence is enabled in configuration.
    fn add_ticket(&self, ticket: &Ticket) -> Result<(), ApplyError>;
}
