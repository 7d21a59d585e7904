//! chainsync-core: domain types, configuration, and error taxonomy for the
//! chain event synchronizer. Pure data crate: no async, no IO.

pub mod config;
pub mod error;
pub mod types;

pub use config::{FactoryConfig, NetworkConfig, SyncConfig};
pub use error::{ApplyError, ConfigError, InvalidAddress, WatchError};
pub use types::{AccountMapping, Address, ChainId, EventKind, Ticket};
