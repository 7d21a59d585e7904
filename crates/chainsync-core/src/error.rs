//! Error taxonomy shared across the synchronizer crates.

use thiserror::Error;

use crate::types::ChainId;

/// Rejected configurations. Caught by the controller before any
/// pipeline task is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no networks configured")]
    NoNetworks,

    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("duplicate network: chain {0}")]
    DuplicateNetwork(ChainId),
}

/// Terminal failure of one source's upstream watch. Contained at the
/// source adapter: the failure is logged and that source's queue
/// closes; sibling sources and other pipelines continue.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("watch io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A consumer rejected one event. Contained at the dispatch loop: the
/// event is dropped, later events still flow.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("duplicate ticket: {0}")]
    DuplicateTicket(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Malformed account address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address: {0}")]
pub struct InvalidAddress(pub String);
