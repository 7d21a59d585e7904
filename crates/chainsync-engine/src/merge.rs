//! Fan-in merger: N source queues into one merged queue.

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Merge `inputs` into a single bounded queue of capacity `capacity`.
///
/// One forwarding task per input is spawned onto `tasks`; each forwards
/// events in its input's emission order, racing cancellation at both
/// the take and the hand-off step. No ordering holds between events of
/// different inputs. Every forwarder holds one clone of the merged
/// sender, so the returned receiver closes exactly when the last
/// forwarder has finished, which is exactly when all inputs have closed
/// or cancellation has fired.
pub fn merge<T: Send + 'static>(
    tasks: &mut JoinSet<()>,
    cancel: &CancellationToken,
    inputs: Vec<mpsc::Receiver<T>>,
    capacity: usize,
) -> mpsc::Receiver<T> {
    let (out_tx, out_rx) = mpsc::channel(capacity);

    for mut input in inputs {
        let out = out_tx.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            loop {
                tokio::select! {
                    event = input.recv() => match event {
                        Some(event) => {
                            tokio::select! {
                                sent = out.send(event) => {
                                    if sent.is_err() {
                                        // Merged side gone; nothing left to forward to.
                                        break;
                                    }
                                }
                                _ = cancel.cancelled() => break,
                            }
                        }
                        None => break,
                    },
                    _ = cancel.cancelled() => break,
                }
            }
        });
    }

    out_rx
}
