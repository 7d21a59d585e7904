//! JSONL state store.
//!
//! One JSON object per line, append-only. Restarting the daemon
//! appends to the existing file rather than truncating it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chainsync_core::error::ApplyError;
use chainsync_core::types::{AccountMapping, EventKind, Ticket};
use chainsync_engine::StateStore;
use chrono::Utc;
use serde::Serialize;

/// A single recorded line in the JSONL file.
#[derive(Serialize)]
struct StateRecord<'a, T: Serialize> {
    /// Wall-clock timestamp when the record was written.
    ts: String,
    kind: EventKind,
    #[serde(flatten)]
    event: &'a T,
}

pub struct JsonlStateStore {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonlStateStore {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let writer = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append<T: Serialize>(&self, kind: EventKind, event: &T) -> Result<(), ApplyError> {
        let record = StateRecord {
            ts: Utc::now().to_rfc3339(),
            kind,
            event,
        };
        let line = serde_json::to_string(&record)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

impl StateStore for JsonlStateStore {
    fn add_mapping(&self, mapping: AccountMapping) -> Result<(), ApplyError> {
        self.append(EventKind::AccountMapping, &mapping)
    }

    fn add_ticket(&self, ticket: &Ticket) -> Result<(), ApplyError> {
        self.append(EventKind::Ticket, ticket)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
