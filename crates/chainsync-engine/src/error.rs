//! Engine-level errors.

use chainsync_core::error::ConfigError;
use thiserror::Error;

/// Why `Synchronizer::start` refused to launch.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("synchronizer already started")]
    AlreadyStarted,

    #[error("synchronizer already stopped")]
    Stopped,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
