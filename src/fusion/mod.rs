//! Fusion engine.
//!
//! The engine owns one buffered sample per source, the [`LivenessTracker`]
//! and the output sink. Every operation that changes its inputs recomputes
//! the whole snapshot through [`merge`] and publishes it; there is no
//! incremental patching.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use slipstream::fusion::{FusionEngine, PriorityTable};
//! use slipstream::liveness::LivenessTracker;
//! use slipstream::types::{MemoryFeedSample, MergedSnapshot, PhysicsSample};
//!
//! let mut engine = FusionEngine::new(
//!     PriorityTable::default(),
//!     LivenessTracker::new(Duration::from_secs(5)),
//!     Box::new(|_: Arc<MergedSnapshot>| {}),
//! );
//! let sample = MemoryFeedSample {
//!     physics: Some(PhysicsSample { gear: -1, speed_kmh: 153.7, ..Default::default() }),
//!     ..Default::default()
//! };
//! let snapshot = engine.ingest(sample.into());
//! assert_eq!(snapshot.realtime.gear, "R");
//! assert_eq!(snapshot.realtime.speed_kmh, 154);
//! ```

mod merge;
mod priority;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

use crate::liveness::{LivenessTracker, Stamp, Transition};
use crate::sink::SnapshotSink;
use crate::types::{
    ActiveProtocol, BroadcastSample, CanonicalSample, LivenessReport, MemoryFeedSample,
    MergedSnapshot, SourceId,
};

pub use merge::{Buffers, DEFAULT_MAX_FUEL, DEFAULT_MAX_RPM, merge};
pub use priority::{Category, Offer, Preference, PriorityTable};

/// Point-in-time view of the engine's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct EngineStatus {
    pub active_protocol: ActiveProtocol,
    pub liveness: LivenessReport,
    /// Wall-clock time of the newest accepted sample, `0` if none
    pub last_update_at_ms: u64,
    pub samples_ingested: u64,
    pub snapshots_published: u64,
}

/// Merges the latest sample of each source into [`MergedSnapshot`]s.
pub struct FusionEngine {
    table: PriorityTable,
    tracker: LivenessTracker,
    sink: Box<dyn SnapshotSink>,
    memory: Option<MemoryFeedSample>,
    broadcast: Option<BroadcastSample>,
    current: Arc<MergedSnapshot>,
    samples_ingested: u64,
    snapshots_published: u64,
}

impl std::fmt::Debug for FusionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionEngine")
            .field("tracker", &self.tracker)
            .field("samples_ingested", &self.samples_ingested)
            .field("snapshots_published", &self.snapshots_published)
            .finish_non_exhaustive()
    }
}

impl FusionEngine {
    pub fn new(
        table: PriorityTable,
        tracker: LivenessTracker,
        sink: Box<dyn SnapshotSink>,
    ) -> Self {
        Self {
            table,
            tracker,
            sink,
            memory: None,
            broadcast: None,
            current: Arc::new(MergedSnapshot::default()),
            samples_ingested: 0,
            snapshots_published: 0,
        }
    }

    /// Store a sample as its source's latest, mark the source live and
    /// publish a freshly merged snapshot.
    pub fn ingest(&mut self, sample: CanonicalSample) -> Arc<MergedSnapshot> {
        self.ingest_at(sample, Stamp::now())
    }

    /// [`ingest`](Self::ingest) with an explicit timestamp.
    pub fn ingest_at(&mut self, sample: CanonicalSample, stamp: Stamp) -> Arc<MergedSnapshot> {
        let source = sample.source();
        match sample {
            CanonicalSample::SharedMemory(memory) => self.memory = Some(memory),
            CanonicalSample::Broadcasting(broadcast) => self.broadcast = Some(broadcast),
        }
        self.samples_ingested += 1;
        self.tracker.record(source, stamp);
        trace!(source = %source, "sample ingested");
        self.recompute(stamp.epoch_ms)
    }

    /// Re-publish the current snapshot without recomputing it.
    pub fn tick(&mut self) -> Arc<MergedSnapshot> {
        let snapshot = Arc::clone(&self.current);
        self.publish(Arc::clone(&snapshot));
        snapshot
    }

    /// Run the timeout check. Publishes a new snapshot only when a source
    /// changed state.
    pub fn check_liveness(&mut self, now: Stamp) -> Vec<Transition> {
        let transitions = self.tracker.check(now.at);
        if !transitions.is_empty() {
            self.recompute(now.epoch_ms);
        }
        transitions
    }

    /// Disconnect a source on a signal from its feed.
    pub fn force_disconnect(&mut self, source: SourceId, now: Stamp) -> Option<Transition> {
        let transition = self.tracker.force_disconnect(source)?;
        self.recompute(now.epoch_ms);
        Some(transition)
    }

    /// The most recently published snapshot.
    pub fn current_snapshot(&self) -> Arc<MergedSnapshot> {
        Arc::clone(&self.current)
    }

    /// Merge the current buffers without storing or publishing the result.
    pub fn merge_now(&self, generated_at_ms: u64) -> MergedSnapshot {
        merge(&self.table, self.buffers(), &self.tracker.report(), generated_at_ms)
    }

    pub fn status(&self) -> EngineStatus {
        let liveness = self.tracker.report();
        EngineStatus {
            active_protocol: ActiveProtocol::from_connections(
                liveness.shared_memory.connected,
                liveness.broadcasting.connected,
            ),
            last_update_at_ms: liveness
                .shared_memory
                .last_update_at_ms
                .max(liveness.broadcasting.last_update_at_ms),
            liveness,
            samples_ingested: self.samples_ingested,
            snapshots_published: self.snapshots_published,
        }
    }

    /// When the next source would time out, if any is connected.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tracker.next_deadline()
    }

    pub fn tracker(&self) -> &LivenessTracker {
        &self.tracker
    }

    pub fn has_reported(&self, source: SourceId) -> bool {
        match source {
            SourceId::SharedMemory => self.memory.is_some(),
            SourceId::Broadcasting => self.broadcast.is_some(),
        }
    }

    fn buffers(&self) -> Buffers<'_> {
        Buffers { memory: self.memory.as_ref(), broadcast: self.broadcast.as_ref() }
    }

    fn recompute(&mut self, generated_at_ms: u64) -> Arc<MergedSnapshot> {
        let snapshot = Arc::new(self.merge_now(generated_at_ms));
        self.current = Arc::clone(&snapshot);
        self.publish(Arc::clone(&snapshot));
        snapshot
    }

    fn publish(&mut self, snapshot: Arc<MergedSnapshot>) {
        self.snapshots_published += 1;
        self.sink.publish(snapshot);
    }
}
