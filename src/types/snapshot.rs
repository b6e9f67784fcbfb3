//! The merged snapshot handed to consumers.

use serde::{Deserialize, Serialize};

use super::{
    ActiveProtocol, AidsData, BrakeData, BroadcastingEvent, CarIdentity, ControlsData,
    DriverIdentity, EnergyData, EngineData, GForceData, LapTimes, LivenessReport, PlayerInfo,
    RealtimeData, SessionData, SuspensionData, TrackData, TyreData,
};

/// One consistent view of vehicle and session state.
///
/// Snapshots are immutable. The engine builds a new one whenever its inputs
/// change and shares it behind an `Arc`; nothing patches a published
/// snapshot. A `None` section means no source that can produce it has
/// reported yet. Consumers must treat it as unavailable rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct MergedSnapshot {
    /// Wall-clock generation time, milliseconds since the Unix epoch
    pub generated_at_ms: u64,
    /// Some source has ever delivered data
    pub is_running: bool,
    /// At least one source is currently connected
    pub is_connected: bool,
    pub active_protocol: ActiveProtocol,
    pub liveness: LivenessReport,

    pub car: Option<CarIdentity>,
    pub driver: Option<DriverIdentity>,
    pub realtime: RealtimeData,
    pub engine: Option<EngineData>,
    pub controls: Option<ControlsData>,
    pub g_forces: Option<GForceData>,
    pub tyres: Option<TyreData>,
    pub brakes: Option<BrakeData>,
    pub suspension: Option<SuspensionData>,
    pub aids: Option<AidsData>,
    pub energy: Option<EnergyData>,
    pub lap_times: Option<LapTimes>,
    pub session: Option<SessionData>,
    pub track: Option<TrackData>,
    pub last_event: Option<BroadcastingEvent>,
    pub player: Option<PlayerInfo>,
}

impl MergedSnapshot {
    /// Compare two snapshots ignoring their generation time.
    pub fn same_content(&self, other: &MergedSnapshot) -> bool {
        let mut left = self.clone();
        left.generated_at_ms = other.generated_at_ms;
        left == *other
    }
}
