//! Daemon configuration file.
//!
//! TOML with one `[[network]]` table per chain, a `[factory]` table
//! for the account factory feed, and a `[store]` table for the JSONL
//! state file:
//!
//! ```toml
//! [sync]
//! queue_capacity = 4
//! persist_tickets = true
//!
//! [[network]]
//! chain_id = 8453
//! start_cursor = 19000000
//! socket = "/run/chainsync/base.sock"
//!
//! [factory]
//! socket = "/run/chainsync/factory.sock"
//!
//! [store]
//! path = "/var/lib/chainsync/state.jsonl"
//! ```

use std::path::{Path, PathBuf};

use chainsync_core::config::{FactoryConfig, NetworkConfig, SyncConfig};
use chainsync_core::types::ChainId;
use chainsync_source_relay::RelayWatcher;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub sync: SyncSection,

    #[serde(rename = "network", default)]
    pub networks: Vec<NetworkSection>,

    pub factory: FactorySection,

    pub store: StoreSection,
}

/// Tuning knobs shared by every pipeline.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub queue_capacity: usize,
    pub persist_tickets: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            queue_capacity: 1,
            persist_tickets: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    pub chain_id: ChainId,

    /// Block height to start watching from. Earlier events are skipped.
    #[serde(default)]
    pub start_cursor: u64,

    /// Unix socket the chain's relayer pushes events to.
    pub socket: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct FactorySection {
    #[serde(default)]
    pub start_cursor: u64,

    pub socket: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct StoreSection {
    /// Append-only JSONL file recording synchronized state.
    pub path: PathBuf,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        let config = Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Project the pipeline-relevant subset for the synchronizer.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            networks: self
                .networks
                .iter()
                .map(|n| NetworkConfig {
                    chain_id: n.chain_id,
                    start_cursor: n.start_cursor,
                })
                .collect(),
            factory: FactoryConfig {
                start_cursor: self.factory.start_cursor,
            },
            queue_capacity: self.sync.queue_capacity,
            persist_tickets: self.sync.persist_tickets,
        }
    }

    /// Build the relay watcher serving every configured socket.
    pub fn relay_watcher(&self) -> RelayWatcher {
        let mut watcher = RelayWatcher::new(&self.factory.socket);
        for network in &self.networks {
            watcher = watcher.with_chain_socket(network.chain_id, &network.socket);
        }
        watcher
    }
}

// ─── Tests ────────────────────────────────────────────────────────
