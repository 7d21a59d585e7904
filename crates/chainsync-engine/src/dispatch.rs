//! Dispatch loop: drains one event queue into a consumer capability.

use chainsync_core::error::ApplyError;
use chainsync_core::types::EventKind;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Counters reported by a finished dispatch loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: u64,
    pub failed: u64,
}

/// Apply events from `input` until the queue closes or `cancel` fires.
///
/// The take blocks until an event arrives, the queue closes, or
/// cancellation fires; there is no polling path. A failed apply is
/// logged and that event dropped; later events still flow, so each
/// event is applied at most once and a bad event never wedges the loop.
pub async fn dispatch<T, F>(
    kind: EventKind,
    cancel: CancellationToken,
    mut input: mpsc::Receiver<T>,
    mut apply: F,
) -> DispatchStats
where
    F: FnMut(T) -> Result<(), ApplyError>,
{
    let mut stats = DispatchStats::default();
    loop {
        tokio::select! {
            event = input.recv() => match event {
                Some(event) => match apply(event) {
                    Ok(()) => stats.applied += 1,
                    Err(e) => {
                        stats.failed += 1;
                        warn!(kind = %kind, error = %e, "apply failed, event dropped");
                    }
                },
                None => {
                    info!(kind = %kind, "event queue closed, dispatch exiting");
                    break;
                }
            },
            _ = cancel.cancelled() => {
                info!(kind = %kind, "cancellation requested, dispatch exiting");
                break;
            }
        }
    }
    info!(
        kind = %kind,
        applied = stats.applied,
        failed = stats.failed,
        "dispatch loop stopped"
    );
    stats
}
