//! Unix-socket relay feed.
//!
//! A relayer process connects to the per-source socket and pushes one
//! JSON event per line. Example ticket line:
//!
//! ```json
//! {"chain_id":8453,"tx_hash":"0xabc...","user":"0x2791...","amount":1000,"nonce":7,"block":19000101,"observed_at":"2026-08-22T10:00:00Z"}
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chainsync_core::error::WatchError;
use chainsync_core::types::{AccountMapping, ChainId, Ticket};
use chainsync_engine::traits::ChainWatcher;
use serde::de::DeserializeOwned;
use tokio::io::AsyncBufReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Watcher backed by one relay socket per source.
///
/// Each `watch_*` call binds its socket, accepts relayer connections
/// until cancelled, and forwards admitted events into the source
/// queue. Per-connection readers are joined before the watch returns,
/// so cancellation leaves nothing running.
pub struct RelayWatcher {
    ticket_sockets: HashMap<ChainId, PathBuf>,
    factory_socket: PathBuf,
}

impl RelayWatcher {
    pub fn new(factory_socket: impl Into<PathBuf>) -> Self {
        Self {
            ticket_sockets: HashMap::new(),
            factory_socket: factory_socket.into(),
        }
    }

    #[must_use]
    pub fn with_chain_socket(mut self, chain: ChainId, path: impl Into<PathBuf>) -> Self {
        self.ticket_sockets.insert(chain, path.into());
        self
    }
}

impl ChainWatcher for RelayWatcher {
    async fn watch_tickets(
        &self,
        chain: ChainId,
        from: u64,
        cancel: CancellationToken,
        out: mpsc::Sender<Ticket>,
    ) -> Result<(), WatchError> {
        let path = self.ticket_sockets.get(&chain).ok_or_else(|| {
            WatchError::Unavailable(format!("no relay socket configured for chain {chain}"))
        })?;
        info!(chain = %chain, path = %path.display(), from, "ticket relay listening");
        serve_lines(path, cancel, out, move |ticket: &Ticket| {
            if ticket.chain_id != chain {
                warn!(
                    expected = %chain,
                    got = %ticket.chain_id,
                    tx_hash = %ticket.tx_hash,
                    "relay ticket for wrong chain, skipped"
                );
                return false;
            }
            ticket.block >= from
        })
        .await
    }

    async fn watch_mappings(
        &self,
        from: u64,
        cancel: CancellationToken,
        out: mpsc::Sender<AccountMapping>,
    ) -> Result<(), WatchError> {
        info!(path = %self.factory_socket.display(), from, "factory relay listening");
        serve_lines(
            &self.factory_socket,
            cancel,
            out,
            move |mapping: &AccountMapping| mapping.block >= from,
        )
        .await
    }
}

/// Accept relayer connections on `path` and forward admitted events
/// until cancelled. Events failing `admit` are skipped; a relayer
/// disconnect ends that connection only. All reader tasks are drained
/// before returning and the socket file is removed.
async fn serve_lines<T, F>(
    path: &Path,
    cancel: CancellationToken,
    out: mpsc::Sender<T>,
    admit: F,
) -> Result<(), WatchError>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    // Remove a stale socket file from a previous run.
    if path.exists() {
        tokio::fs::remove_file(path).await?;
    }
    let listener = UnixListener::bind(path)?;
    let admit = Arc::new(admit);

    let mut readers: JoinSet<()> = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    readers.spawn(read_connection(
                        stream,
                        out.clone(),
                        Arc::clone(&admit),
                        cancel.clone(),
                    ));
                }
                Err(e) => {
                    warn!("relay accept error: {e}");
                }
            },
            // Reap finished readers; reconnect churn must not grow the set
            // for the life of the watch.
            Some(res) = readers.join_next(), if !readers.is_empty() => {
                if let Err(e) = res {
                    warn!(error = %e, "relay reader ended abnormally");
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    // Readers observe the same token; wait for them rather than abort.
    while let Some(res) = readers.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "relay reader ended abnormally");
        }
    }
    let _ = tokio::fs::remove_file(path).await;
    Ok(())
}

async fn read_connection<T, F>(
    stream: UnixStream,
    out: mpsc::Sender<T>,
    admit: Arc<F>,
    cancel: CancellationToken,
) where
    T: DeserializeOwned + Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let mut lines = tokio::io::BufReader::new(stream).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<T>(line) {
                        Ok(event) => {
                            if !admit(&event) {
                                continue;
                            }
                            tokio::select! {
                                sent = out.send(event) => {
                                    if sent.is_err() {
                                        return;
                                    }
                                }
                                _ = cancel.cancelled() => return,
                            }
                        }
                        Err(e) => {
                            warn!("failed to parse relay line: {e}");
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("relay read error: {e}");
                    break;
                }
            },
            _ = cancel.cancelled() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainsync_core::types::Address;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::time::timeout;

    fn addr(hex: &str) -> Address {
        format!("0x{hex}").parse().expect("address")
    }

    fn ticket(chain: u64, n: u64) -> Ticket {
        Ticket {
            chain_id: ChainId(chain),
            tx_hash: format!("0x{chain:02x}{n:06x}"),
            user: addr("27916984c665f15041929b68451303136fa16653"),
            amount: 500 + u128::from(n),
            nonce: n,
            block: n,
            observed_at: Utc::now(),
        }
    }

    async fn connect(path: &Path) -> UnixStream {
        for _ in 0..100 {
            if let Ok(stream) = UnixStream::connect(path).await {
                return stream;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("could not connect to {}", path.display());
    }

    async fn push_line(stream: &mut UnixStream, line: &str) {
        stream
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write line");
    }

    #[tokio::test]
    async fn tickets_flow_from_socket_to_queue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("chain-1.sock");
        let watcher = Arc::new(RelayWatcher::new("/nonexistent").with_chain_socket(
            ChainId(1),
            &socket,
        ));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(8);
        let watch = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch_tickets(ChainId(1), 2, cancel, tx).await })
        };

        let mut stream = connect(&socket).await;
        // Below the start cursor: skipped.
        push_line(
            &mut stream,
            &serde_json::to_string(&ticket(1, 1)).expect("json"),
        )
        .await;
        // Wrong chain: skipped.
        push_line(
            &mut stream,
            &serde_json::to_string(&ticket(99, 5)).expect("json"),
        )
        .await;
        // Garbage: skipped with a warning.
        push_line(&mut stream, "{not json").await;
        // These two are admitted.
        push_line(
            &mut stream,
            &serde_json::to_string(&ticket(1, 2)).expect("json"),
        )
        .await;
        push_line(
            &mut stream,
            &serde_json::to_string(&ticket(1, 3)).expect("json"),
        )
        .await;

        let first = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("first admitted ticket")
            .expect("queue open");
        let second = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("second admitted ticket")
            .expect("queue open");
        assert_eq!((first.nonce, second.nonce), (2, 3));

        cancel.cancel();
        let outcome = timeout(Duration::from_secs(2), watch)
            .await
            .expect("watch should end after cancellation")
            .expect("join");
        assert!(outcome.is_ok());
        assert_eq!(rx.recv().await, None, "queue closes once the watch ends");
    }

    #[tokio::test]
    async fn relayer_disconnect_does_not_end_the_watch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("chain-1.sock");
        let watcher =
            Arc::new(RelayWatcher::new("/nonexistent").with_chain_socket(ChainId(1), &socket));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(8);
        let watch = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch_tickets(ChainId(1), 0, cancel, tx).await })
        };

        let mut first = connect(&socket).await;
        push_line(
            &mut first,
            &serde_json::to_string(&ticket(1, 1)).expect("json"),
        )
        .await;
        let got = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("first ticket")
            .expect("queue open");
        assert_eq!(got.nonce, 1);
        drop(first);

        let mut second = connect(&socket).await;
        push_line(
            &mut second,
            &serde_json::to_string(&ticket(1, 2)).expect("json"),
        )
        .await;
        let got = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("second ticket")
            .expect("queue open");
        assert_eq!(got.nonce, 2);

        cancel.cancel();
        timeout(Duration::from_secs(2), watch)
            .await
            .expect("watch should end after cancellation")
            .expect("join")
            .expect("watch outcome");
    }

    #[tokio::test]
    async fn reconnect_churn_delivers_every_ticket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("chain-1.sock");
        let watcher =
            Arc::new(RelayWatcher::new("/nonexistent").with_chain_socket(ChainId(1), &socket));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(8);
        let watch = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch_tickets(ChainId(1), 0, cancel, tx).await })
        };

        // One short-lived relayer per ticket, like a flapping upstream.
        for n in 1..=8 {
            let mut stream = connect(&socket).await;
            push_line(
                &mut stream,
                &serde_json::to_string(&ticket(1, n)).expect("json"),
            )
            .await;
            let got = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("ticket")
                .expect("queue open");
            assert_eq!(got.nonce, n);
        }

        cancel.cancel();
        timeout(Duration::from_secs(2), watch)
            .await
            .expect("watch should end after cancellation")
            .expect("join")
            .expect("watch outcome");
    }

    #[tokio::test]
    async fn mappings_flow_from_factory_socket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("factory.sock");
        let watcher = Arc::new(RelayWatcher::new(&socket));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(8);
        let watch = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch_mappings(0, cancel, tx).await })
        };

        let mapping = AccountMapping {
            user: addr("27916984c665f15041929b68451303136fa16653"),
            account: addr("d31959035048676fc27d84c8bc120997204b16b6"),
            block: 12,
        };
        let mut stream = connect(&socket).await;
        push_line(&mut stream, &serde_json::to_string(&mapping).expect("json")).await;

        let got = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("mapping")
            .expect("queue open");
        assert_eq!(got, mapping);

        cancel.cancel();
        timeout(Duration::from_secs(2), watch)
            .await
            .expect("watch should end after cancellation")
            .expect("join")
            .expect("watch outcome");
    }

    #[tokio::test]
    async fn unknown_chain_is_reported_unavailable() {
        let watcher = RelayWatcher::new("/nonexistent");
        let (tx, _rx) = mpsc::channel(1);
        let outcome = watcher
            .watch_tickets(ChainId(404), 0, CancellationToken::new(), tx)
            .await;
        assert!(matches!(outcome, Err(WatchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn cancellation_ends_an_idle_watch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("chain-1.sock");
        let watcher =
            Arc::new(RelayWatcher::new("/nonexistent").with_chain_socket(ChainId(1), &socket));

        let cancel = CancellationToken::new();
        let (tx, _rx) = mpsc::channel::<Ticket>(1);
        let watch = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch_tickets(ChainId(1), 0, cancel, tx).await })
        };

        // Let the listener come up, then cancel with no relayer attached.
        connect(&socket).await;
        cancel.cancel();
        timeout(Duration::from_secs(2), watch)
            .await
            .expect("watch should end after cancellation")
            .expect("join")
            .expect("watch outcome");
    }
}
