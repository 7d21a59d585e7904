//! In-memory ticket pool.

use std::sync::{Mutex, PoisonError};

use chainsync_core::error::ApplyError;
use chainsync_core::types::Ticket;
use chainsync_engine::TicketPool;

/// Process-local pool of tickets awaiting execution.
///
/// Duplicate transaction hashes are rejected, so a replayed relay line
/// cannot double-count a ticket.
#[derive(Default)]
pub struct InMemoryTicketPool {
    tickets: Mutex<Vec<Ticket>>,
}

impl InMemoryTicketPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the pooled tickets in arrival order.
    pub fn snapshot(&self) -> Vec<Ticket> {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TicketPool for InMemoryTicketPool {
    fn add_ticket(&self, ticket: Ticket) -> Result<(), ApplyError> {
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        if tickets.iter().any(|t| t.tx_hash == ticket.tx_hash) {
            return Err(ApplyError::DuplicateTicket(ticket.tx_hash));
        }
        tickets.push(ticket);
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────
