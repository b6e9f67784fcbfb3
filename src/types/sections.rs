//! Telemetry sections shared by canonical samples and merged snapshots.
//!
//! Each source adapter fills the sections it can produce; the fusion engine
//! then picks one source's section per category. A section is never assembled
//! from two sources except for [`RealtimeData`], which is merged per field
//! group.

use serde::{Deserialize, Serialize};

use super::{Confidence, SourceId};

/// Identity of the player's car.
///
/// Name lookup tables are outside this crate, so the broadcast feed only
/// supplies numeric ids while the memory feed supplies the model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarIdentity {
    pub model: String,
    pub model_id: Option<u8>,
    pub team_name: String,
    pub race_number: i32,
    pub cup_category: Option<u8>,
    pub nationality: Option<u16>,
}

/// Identity of the current driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverIdentity {
    pub first_name: String,
    pub last_name: String,
    pub short_name: String,
    pub category: Option<u8>,
    pub nationality: Option<u16>,
}

/// Speed, gear and RPM as one source reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Motion {
    pub speed_kmh: f32,
    pub gear: i32,
    pub rpm: Option<f32>,
    pub confidence: Confidence,
}

/// Where the car is, on track and in the standings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum CarLocation {
    #[default]
    Unknown,
    Track,
    Pitlane,
    PitEntry,
    PitExit,
}

impl CarLocation {
    /// Map the broadcast protocol's location code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => CarLocation::Track,
            2 => CarLocation::Pitlane,
            3 => CarLocation::PitEntry,
            4 => CarLocation::PitExit,
            _ => CarLocation::Unknown,
        }
    }
}

/// Race standing and track placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Standing {
    pub position: u32,
    pub cup_position: u32,
    pub track_position: u32,
    pub spline_position: f32,
    pub laps: u32,
    /// Delta to best lap in milliseconds
    pub delta_ms: f32,
    pub car_location: CarLocation,
    pub world_position: [f32; 3],
    pub yaw: f32,
}

/// One lap record with its three sector splits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapRecord {
    pub laptime_ms: Option<u32>,
    pub splits: [Option<u32>; 3],
    pub is_valid_for_best: bool,
    pub is_invalid: bool,
}

impl LapRecord {
    /// A record carrying only a lap time.
    pub fn with_time(laptime_ms: Option<u32>) -> Self {
        Self { laptime_ms, ..Self::default() }
    }
}

/// Best, last and current lap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapTimes {
    pub best: LapRecord,
    pub last: LapRecord,
    pub current: LapRecord,
}

/// Session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SessionData {
    pub session_type: i32,
    pub phase: u8,
    pub event_index: u32,
    pub session_index: u32,
    pub session_time_ms: f32,
    pub session_end_time_ms: f32,
    pub time_of_day_ms: f32,
    pub focused_car_index: Option<u16>,
    pub active_camera_set: String,
    pub active_camera: String,
    pub current_hud_page: String,
    pub is_replay_playing: bool,
    pub ambient_temp: f32,
    pub track_temp: f32,
    pub clouds: f32,
    pub rain_level: f32,
    pub wetness: f32,
}

/// Track description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackData {
    pub name: String,
    pub track_id: Option<u32>,
    pub length_m: Option<u32>,
}

/// Most recent broadcasting event (accident, penalty, best lap, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BroadcastingEvent {
    pub kind: u8,
    pub message: String,
    pub time_ms: i64,
    pub car_id: i64,
}

/// How the broadcast source identified the player's car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PlayerInfo {
    pub car_index: Option<u16>,
    pub identified: bool,
    pub all_cars_count: u32,
}

/// Realtime summary. Always present in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RealtimeData {
    /// Rounded km/h
    pub speed_kmh: u32,
    /// `"R"`, `"N"` or the forward gear number
    pub gear: String,
    pub rpm: u32,
    pub position: u32,
    pub cup_position: u32,
    pub laps: u32,
    pub delta_ms: f32,
    pub car_location: CarLocation,
    pub world_position: [f32; 3],
    pub yaw: f32,
    /// Source the speed/gear/rpm group came from
    pub motion_source: Option<SourceId>,
    pub motion_confidence: Option<Confidence>,
}

impl Default for RealtimeData {
    fn default() -> Self {
        Self {
            speed_kmh: 0,
            gear: "N".to_owned(),
            rpm: 0,
            position: 0,
            cup_position: 0,
            laps: 0,
            delta_ms: 0.0,
            car_location: CarLocation::Unknown,
            world_position: [0.0; 3],
            yaw: 0.0,
            motion_source: None,
            motion_confidence: None,
        }
    }
}

/// Engine state with the car's static limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct EngineData {
    pub rpm: u32,
    pub engine_temp: f32,
    pub turbo_boost: f32,
    pub fuel: f32,
    pub max_rpm: f32,
    pub max_power: f32,
    pub max_fuel: f32,
}

/// Driver inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ControlsData {
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,
    pub steer_angle: f32,
}

/// Accelerations in g.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct GForceData {
    pub longitudinal: f32,
    pub lateral: f32,
    pub vertical: f32,
}

/// Tyre compound and per-wheel state (FL, FR, RL, RR).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TyreData {
    pub compound: String,
    pub core_temperatures: [f32; 4],
    pub pressures: [f32; 4],
}

/// Brake temperatures and bias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BrakeData {
    pub temperatures: [f32; 4],
    pub bias: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SuspensionData {
    pub ride_height: [f32; 2],
    pub travel: [f32; 4],
}

/// Setting and current intervention of one driver aid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AidState {
    pub level: f32,
    pub active: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AidsData {
    pub abs: AidState,
    pub tc: AidState,
    pub auto_shifter: bool,
    pub pit_limiter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ErsState {
    pub is_charging: bool,
    pub recovery_level: f32,
    pub power_level: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct KersState {
    pub current_kj: f32,
    pub max_kj: f32,
    pub input: f32,
}

/// Energy recovery and drag reduction. ERS/KERS detail needs a physics
/// record; the capability flags come from the static record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct EnergyData {
    pub has_ers: bool,
    pub has_kers: bool,
    pub has_drs: bool,
    pub ers: Option<ErsState>,
    pub kers: Option<KersState>,
    pub drs_active: Option<bool>,
}
