//! Where merged snapshots go.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::MergedSnapshot;

/// Receives every snapshot the engine publishes.
///
/// Publication happens on the engine's task, so implementations must not
/// block. Closures taking an `Arc<MergedSnapshot>` are sinks too:
///
/// ```rust
/// use std::sync::Arc;
/// use slipstream::{MergedSnapshot, SnapshotSink};
///
/// let mut seen = 0usize;
/// let mut sink = |_: Arc<MergedSnapshot>| seen += 1;
/// sink.publish(Arc::new(MergedSnapshot::default()));
/// ```
pub trait SnapshotSink: Send {
    fn publish(&mut self, snapshot: Arc<MergedSnapshot>);
}

impl<F> SnapshotSink for F
where
    F: FnMut(Arc<MergedSnapshot>) + Send,
{
    fn publish(&mut self, snapshot: Arc<MergedSnapshot>) {
        self(snapshot)
    }
}

/// Latest-value sink backed by a `watch` channel.
///
/// Slow receivers skip intermediate snapshots and always observe the newest.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Arc<MergedSnapshot>>,
}

impl WatchSink {
    /// Create the sink and its first receiver, seeded with an empty snapshot.
    pub fn new() -> (Self, watch::Receiver<Arc<MergedSnapshot>>) {
        let (tx, rx) = watch::channel(Arc::new(MergedSnapshot::default()));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MergedSnapshot>> {
        self.tx.subscribe()
    }
}

impl SnapshotSink for WatchSink {
    fn publish(&mut self, snapshot: Arc<MergedSnapshot>) {
        // Stores the value even while no receiver is attached.
        self.tx.send_replace(snapshot);
    }
}
