//! chainsync-engine: concurrent multi-source event synchronization.
//! Watches configured chains through an injected watcher capability,
//! fans the per-chain streams into one queue, and applies each event
//! to the downstream consumers. Shutdown is cooperative and complete:
//! stop() cancels every task and joins it before returning.

pub mod dispatch;
pub mod error;
pub mod merge;
pub mod sync;
pub mod traits;
pub mod watch;

pub use dispatch::{DispatchStats, dispatch};
pub use error::StartError;
pub use merge::merge;
pub use sync::Synchronizer;
pub use traits::{ChainWatcher, StateStore, TicketPool};
