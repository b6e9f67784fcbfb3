//! Per-source liveness.
//!
//! Each source moves through `Unknown -> Connected -> Disconnected ->
//! Connected -> ...`. Any accepted sample connects a source; a periodic
//! [`LivenessTracker::check`] disconnects it once more than the timeout has
//! passed since its last sample. Every transition is returned exactly once,
//! so callers can log or react without deduplicating.
//!
//! Time is always passed in. The tracker never reads a clock, which keeps it
//! deterministic under test and lets the driver arm a single timer from
//! [`LivenessTracker::next_deadline`].

use std::fmt::Debug;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::info;

use crate::types::{LinkState, LivenessReport, SourceId, SourceLiveness};

/// A point in time on both clocks: monotonic for timeouts, wall-clock for
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub at: Instant,
    pub epoch_ms: u64,
}

impl Stamp {
    pub fn new(at: Instant, epoch_ms: u64) -> Self {
        Self { at, epoch_ms }
    }

    pub fn now() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self { at: Instant::now(), epoch_ms }
    }
}

/// Assigns a quality score to a source when it (re)connects.
pub trait QualityScorer: Send + Debug {
    /// Score in `0..=100`.
    fn score(&self, source: SourceId) -> u8;
}

/// Constant score per source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQualityScore {
    pub shared_memory: u8,
    pub broadcasting: u8,
}

impl Default for FixedQualityScore {
    fn default() -> Self {
        Self { shared_memory: 95, broadcasting: 90 }
    }
}

impl QualityScorer for FixedQualityScore {
    fn score(&self, source: SourceId) -> u8 {
        match source {
            SourceId::SharedMemory => self.shared_memory,
            SourceId::Broadcasting => self.broadcasting,
        }
        .min(100)
    }
}

/// A change of link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub source: SourceId,
    pub from: LinkState,
    pub to: LinkState,
    /// Score after the transition
    pub quality_score: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    state: LinkState,
    last_at: Option<Instant>,
    last_epoch_ms: u64,
    quality_score: u8,
}

/// Connected/disconnected state of both sources.
#[derive(Debug)]
pub struct LivenessTracker {
    timeout: Duration,
    scorer: Box<dyn QualityScorer>,
    slots: [Slot; 2],
}

impl LivenessTracker {
    /// Tracker with the fixed per-source scores.
    pub fn new(timeout: Duration) -> Self {
        Self::with_scorer(timeout, Box::new(FixedQualityScore::default()))
    }

    pub fn with_scorer(timeout: Duration, scorer: Box<dyn QualityScorer>) -> Self {
        Self { timeout, scorer, slots: [Slot::default(); 2] }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Note an accepted sample. Returns the transition if the source was not
    /// already connected.
    pub fn record(&mut self, source: SourceId, stamp: Stamp) -> Option<Transition> {
        let score = self.scorer.score(source);
        let slot = &mut self.slots[source.index()];
        slot.last_at = Some(stamp.at);
        slot.last_epoch_ms = stamp.epoch_ms;
        if slot.state == LinkState::Connected {
            return None;
        }

        let from = slot.state;
        slot.state = LinkState::Connected;
        slot.quality_score = score;
        let transition = Transition { source, from, to: LinkState::Connected, quality_score: score };
        info!(source = %source, quality = score, "source connected");
        Some(transition)
    }

    /// Disconnect every connected source whose last sample is older than the
    /// timeout.
    pub fn check(&mut self, now: Instant) -> Vec<Transition> {
        let expired: Vec<SourceId> = SourceId::ALL
            .into_iter()
            .filter(|&source| {
                let slot = &self.slots[source.index()];
                slot.state == LinkState::Connected
                    && slot
                        .last_at
                        .is_some_and(|last| now.saturating_duration_since(last) > self.timeout)
            })
            .collect();
        expired.into_iter().filter_map(|source| self.disconnect(source, "timeout")).collect()
    }

    /// Disconnect a source on an explicit signal from its feed.
    pub fn force_disconnect(&mut self, source: SourceId) -> Option<Transition> {
        self.disconnect(source, "feed signal")
    }

    fn disconnect(&mut self, source: SourceId, cause: &'static str) -> Option<Transition> {
        let slot = &mut self.slots[source.index()];
        if slot.state != LinkState::Connected {
            return None;
        }
        slot.state = LinkState::Disconnected;
        slot.quality_score = 0;
        info!(source = %source, cause, "source disconnected");
        Some(Transition {
            source,
            from: LinkState::Connected,
            to: LinkState::Disconnected,
            quality_score: 0,
        })
    }

    /// Earliest instant at which [`check`](Self::check) would disconnect a
    /// source, if any source is connected.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter(|slot| slot.state == LinkState::Connected)
            .filter_map(|slot| slot.last_at)
            .map(|last| last + self.timeout + Duration::from_millis(1))
            .min()
    }

    pub fn state(&self, source: SourceId) -> LinkState {
        self.slots[source.index()].state
    }

    pub fn is_connected(&self, source: SourceId) -> bool {
        self.state(source) == LinkState::Connected
    }

    pub fn quality_score(&self, source: SourceId) -> u8 {
        self.slots[source.index()].quality_score
    }

    pub fn liveness(&self, source: SourceId) -> SourceLiveness {
        let slot = &self.slots[source.index()];
        SourceLiveness {
            connected: slot.state == LinkState::Connected,
            state: slot.state,
            last_update_at_ms: slot.last_epoch_ms,
            quality_score: slot.quality_score,
        }
    }

    pub fn report(&self) -> LivenessReport {
        LivenessReport {
            shared_memory: self.liveness(SourceId::SharedMemory),
            broadcasting: self.liveness(SourceId::Broadcasting),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const TIMEOUT: Duration = Duration::from_millis(5000);

    fn stamp(base: Instant, offset_ms: u64) -> Stamp {
        Stamp::new(base + Duration::from_millis(offset_ms), 1_000_000 + offset_ms)
    }

    #[test]
    fn first_sample_connects_with_fixed_score() {
        let base = Instant::now();
        let mut tracker = LivenessTracker::new(TIMEOUT);
        assert_eq!(tracker.state(SourceId::SharedMemory), LinkState::Unknown);

        let transition = tracker.record(SourceId::SharedMemory, stamp(base, 0)).unwrap();
        assert_eq!(transition.from, LinkState::Unknown);
        assert_eq!(transition.quality_score, 95);
        assert_eq!(tracker.record(SourceId::SharedMemory, stamp(base, 10)), None);

        let transition = tracker.record(SourceId::Broadcasting, stamp(base, 20)).unwrap();
        assert_eq!(transition.quality_score, 90);
    }

    #[test]
    fn timeout_disconnects_exactly_once() {
        let base = Instant::now();
        let mut tracker = LivenessTracker::new(TIMEOUT);
        tracker.record(SourceId::Broadcasting, stamp(base, 0));

        assert!(tracker.check(base + TIMEOUT).is_empty());
        let transitions = tracker.check(base + TIMEOUT + Duration::from_millis(1));
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, LinkState::Disconnected);
        assert_eq!(tracker.quality_score(SourceId::Broadcasting), 0);

        assert!(tracker.check(base + TIMEOUT * 2).is_empty());
        assert!(tracker.check(base + TIMEOUT * 10).is_empty());
    }

    #[test]
    fn sample_after_disconnect_reconnects() {
        let base = Instant::now();
        let mut tracker = LivenessTracker::new(TIMEOUT);
        tracker.record(SourceId::SharedMemory, stamp(base, 0));
        tracker.check(base + TIMEOUT * 2);

        let transition = tracker.record(SourceId::SharedMemory, stamp(base, 12_000)).unwrap();
        assert_eq!(transition.from, LinkState::Disconnected);
        assert_eq!(tracker.liveness(SourceId::SharedMemory).last_update_at_ms, 1_012_000);
        assert!(tracker.is_connected(SourceId::SharedMemory));
    }

    #[test]
    fn force_disconnect_only_from_connected() {
        let base = Instant::now();
        let mut tracker = LivenessTracker::new(TIMEOUT);
        assert_eq!(tracker.force_disconnect(SourceId::Broadcasting), None);
        assert_eq!(tracker.state(SourceId::Broadcasting), LinkState::Unknown);

        tracker.record(SourceId::Broadcasting, stamp(base, 0));
        assert!(tracker.force_disconnect(SourceId::Broadcasting).is_some());
        assert_eq!(tracker.force_disconnect(SourceId::Broadcasting), None);
    }

    #[test]
    fn next_deadline_tracks_oldest_connected_source() {
        let base = Instant::now();
        let mut tracker = LivenessTracker::new(TIMEOUT);
        assert_eq!(tracker.next_deadline(), None);

        tracker.record(SourceId::SharedMemory, stamp(base, 100));
        tracker.record(SourceId::Broadcasting, stamp(base, 0));
        let deadline = tracker.next_deadline().unwrap();
        assert_eq!(deadline, base + TIMEOUT + Duration::from_millis(1));
        assert_eq!(tracker.check(deadline).len(), 1);
        assert_eq!(
            tracker.next_deadline(),
            Some(base + Duration::from_millis(100) + TIMEOUT + Duration::from_millis(1))
        );
    }

    #[derive(Debug)]
    struct Halved;

    impl QualityScorer for Halved {
        fn score(&self, _source: SourceId) -> u8 {
            50
        }
    }

    #[test]
    fn custom_scorer_is_used_on_connect() {
        let mut tracker = LivenessTracker::with_scorer(TIMEOUT, Box::new(Halved));
        tracker.record(SourceId::SharedMemory, Stamp::now());
        assert_eq!(tracker.report().shared_memory.quality_score, 50);
    }

    proptest! {
        #[test]
        fn prop_each_silence_yields_one_disconnect(gaps in prop::collection::vec(0u64..12_000, 1..40)) {
            let base = Instant::now();
            let mut tracker = LivenessTracker::new(TIMEOUT);
            let mut now_ms = 0u64;
            let mut connected = false;
            for gap in gaps {
                tracker.record(SourceId::SharedMemory, stamp(base, now_ms));
                connected = true;
                now_ms += gap;
                let transitions = tracker.check(base + Duration::from_millis(now_ms));
                let again = tracker.check(base + Duration::from_millis(now_ms));
                prop_assert!(again.is_empty());
                if gap > 5000 {
                    prop_assert_eq!(transitions.len(), 1);
                    connected = false;
                } else {
                    prop_assert!(transitions.is_empty());
                }
                prop_assert_eq!(tracker.is_connected(SourceId::SharedMemory), connected);
            }
        }
    }
}
