//! Canonical samples: one normalized record per source.
//!
//! A canonical sample is what an adapter hands the fusion engine. It is the
//! adapter's latest view of its source, so sections that were reported once
//! stay populated until the same source replaces them.

use serde::{Deserialize, Serialize};

use super::{
    BroadcastingEvent, CarIdentity, Confidence, DriverIdentity, GraphicsSample, LapTimes, Motion,
    PhysicsSample, PlayerInfo, SessionData, SourceId, Standing, StaticSessionInfo, TrackData,
};

/// Latest physics, graphics and static records from the memory feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFeedSample {
    pub physics: Option<PhysicsSample>,
    pub graphics: Option<GraphicsSample>,
    pub static_info: Option<StaticSessionInfo>,
}

impl MemoryFeedSample {
    /// Whether any record has been received.
    pub fn is_empty(&self) -> bool {
        self.physics.is_none() && self.graphics.is_none() && self.static_info.is_none()
    }
}

/// Latest state assembled from the broadcast feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastSample {
    pub car: Option<CarIdentity>,
    pub driver: Option<DriverIdentity>,
    pub motion: Option<Motion>,
    pub standing: Option<Standing>,
    pub lap_times: Option<LapTimes>,
    pub session: Option<SessionData>,
    pub track: Option<TrackData>,
    pub last_event: Option<BroadcastingEvent>,
    pub player: PlayerInfo,
}

impl BroadcastSample {
    /// Confidence of the realtime motion values, if any were reported.
    pub fn motion_confidence(&self) -> Option<Confidence> {
        self.motion.as_ref().map(|m| m.confidence)
    }
}

/// A normalized sample from either source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CanonicalSample {
    SharedMemory(MemoryFeedSample),
    Broadcasting(BroadcastSample),
}

impl CanonicalSample {
    /// The source this sample belongs to.
    pub fn source(&self) -> SourceId {
        match self {
            CanonicalSample::SharedMemory(_) => SourceId::SharedMemory,
            CanonicalSample::Broadcasting(_) => SourceId::Broadcasting,
        }
    }
}

impl From<MemoryFeedSample> for CanonicalSample {
    fn from(sample: MemoryFeedSample) -> Self {
        CanonicalSample::SharedMemory(sample)
    }
}

impl From<BroadcastSample> for CanonicalSample {
    fn from(sample: BroadcastSample) -> Self {
        CanonicalSample::Broadcasting(sample)
    }
}
