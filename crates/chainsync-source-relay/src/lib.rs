//! chainsync-source-relay: `ChainWatcher` implementation fed by external
//! relayer processes over Unix domain sockets. Each source gets its own
//! socket carrying newline-delimited JSON events.

pub mod relay;

pub use relay::RelayWatcher;
