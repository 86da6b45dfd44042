use crate::snapshot::Snapshot;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Latest snapshot published to every subscriber; `None` marks a failed refresh.
pub type SnapshotSender = watch::Sender<Option<Arc<Snapshot>>>;
pub type SnapshotFeed = watch::Receiver<Option<Arc<Snapshot>>>;

pub fn channel() -> (SnapshotSender, SnapshotFeed) {
    watch::channel(None)
}

/// Reads one JSON snapshot per line from the acquisition process and
/// publishes each as a refresh cycle.
pub struct SnapshotReader<R> {
    input: R,
    sender: SnapshotSender,
}

impl<R> SnapshotReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Spawns the reader on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}

impl<R: AsyncRead + Unpin> SnapshotReader<R> {
    pub fn new(input: R, sender: SnapshotSender) -> Self {
        Self { input, sender }
    }

    /// Publishes one cycle per input line until end of input. Lines that are
    /// not a snapshot, including ones that are not UTF-8, publish a failed
    /// refresh.
    pub async fn run(self) {
        info!("Starting snapshot reader");
        let mut lines = BufReader::new(self.input).split(b'\n');
        let mut cycles = 0u64;

        loop {
            let line = match lines.next_segment().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Snapshot input failed");
                    break;
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            cycles += 1;
            let snapshot = parse_snapshot_bytes(&line).map(Arc::new);
            debug!(
                cycle = cycles,
                fields = snapshot.as_ref().map(|s| s.len()),
                "Publishing snapshot"
            );
            if self.sender.send(snapshot).is_err() {
                info!("No snapshot subscribers left, stopping reader");
                break;
            }
        }

        info!(cycles, "Snapshot reader exiting");
    }
}

/// Parses one refresh cycle. `None` means the source was unavailable for
/// that cycle, either reported as `null` or unreadable.
pub fn parse_snapshot_line(line: &str) -> Option<Snapshot> {
    parse_snapshot_bytes(line.as_bytes())
}

pub fn parse_snapshot_bytes(line: &[u8]) -> Option<Snapshot> {
    match serde_json::from_slice::<Option<Snapshot>>(line) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "Unreadable snapshot, treating refresh as failed");
            None
        }
    }
}
