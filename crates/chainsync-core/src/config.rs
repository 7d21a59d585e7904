//! Synchronizer configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ChainId;

/// One watched network, feeding the ticket pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: ChainId,
    /// Block cursor the ticket watch starts from.
    #[serde(default)]
    pub start_cursor: u64,
}

/// The account factory watch, feeding the mapping pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    #[serde(default)]
    pub start_cursor: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Ticket sources, one per network.
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,

    #[serde(default)]
    pub factory: FactoryConfig,

    /// Bounded capacity of every source queue and the merged queue.
    /// The default of 1 keeps hand-off synchronous: a slow consumer
    /// throttles all producers instead of growing a buffer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Write pooled tickets through to the state store as well.
    /// Off by default; the pool alone holds them.
    #[serde(default)]
    pub persist_tickets: bool,
}

fn default_queue_capacity() -> usize {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            factory: FactoryConfig::default(),
            queue_capacity: default_queue_capacity(),
            persist_tickets: false,
        }
    }
}

impl SyncConfig {
    /// Reject configurations no pipeline can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        let mut seen = std::collections::HashSet::new();
        for network in &self.networks {
            if !seen.insert(network.chain_id) {
                return Err(ConfigError::DuplicateNetwork(network.chain_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(chain: u64) -> NetworkConfig {
        NetworkConfig {
            chain_id: ChainId(chain),
            start_cursor: 0,
        }
    }

    #[test]
    fn defaults_keep_handoff_synchronous() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.queue_capacity, 1);
        assert!(!cfg.persist_tickets);
        assert!(cfg.networks.is_empty());
    }

    #[test]
    fn empty_json_object_deserializes_to_defaults() {
        let cfg: SyncConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(cfg, SyncConfig::default());
    }

    #[test]
    fn validate_rejects_zero_networks() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.validate(), Err(ConfigError::NoNetworks));
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let cfg = SyncConfig {
            networks: vec![network(1)],
            queue_capacity: 0,
            ..SyncConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroQueueCapacity));
    }

    #[test]
    fn validate_rejects_duplicate_chain() {
        let cfg = SyncConfig {
            networks: vec![network(10), network(10)],
            ..SyncConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateNetwork(ChainId(10)))
        );
    }

    #[test]
    fn validate_accepts_multiple_networks() {
        let cfg = SyncConfig {
            networks: vec![network(1), network(10), network(8453)],
            ..SyncConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
