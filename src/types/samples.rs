//! Memory-feed records after normalization.
//!
//! These structures hold the canonical, defaulted form of the three record
//! kinds delivered by the memory feed. Every numeric field is finite and
//! defaults to zero; every string has been through [`crate::sanitize()`].

use serde::{Deserialize, Serialize};

/// High-rate vehicle physics (typically every 20-50 ms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PhysicsSample {
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,
    /// Fuel level in litres
    pub fuel: f32,
    /// Signed gear: `-1` reverse, `0` neutral, `>0` forward
    pub gear: i32,
    pub rpm: f32,
    pub speed_kmh: f32,
    pub steer_angle: f32,
    /// Acceleration in g as `[lateral, vertical, longitudinal]`
    pub acc_g: [f32; 3],
    pub tyre_core_temp: [f32; 4],
    pub tyre_pressure: [f32; 4],
    pub brake_temp: [f32; 4],
    /// Front brake share in `[0, 1]`
    pub brake_bias: f32,
    pub ride_height: [f32; 2],
    pub suspension_travel: [f32; 4],
    pub turbo_boost: f32,
    pub engine_temp: f32,
    pub air_temp: f32,
    pub road_temp: f32,
    pub abs_level: f32,
    pub abs_in_action: f32,
    pub tc_level: f32,
    pub tc_in_action: f32,
    pub auto_shifter: bool,
    pub pit_limiter: bool,
    pub ers_charging: bool,
    pub ers_recovery_level: f32,
    pub ers_power_level: f32,
    pub kers_current_kj: f32,
    pub kers_max_kj: f32,
    pub kers_input: f32,
    pub drs: bool,
}

/// Session and HUD state (typically every 100 ms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct GraphicsSample {
    /// Session phase/status code as reported by the simulator
    pub status: u8,
    pub session_type: i32,
    pub position: u32,
    pub completed_laps: u32,
    /// `m:ss.mmm` or `--:--.---`
    pub current_time: String,
    pub last_time: String,
    pub best_time: String,
    /// Delta to best lap in seconds
    pub delta_lap_time: f32,
    pub is_in_pit: bool,
    pub flag: u8,
    pub penalty: u8,
    pub tyre_compound: String,
    pub rain_intensity: f32,
    pub track_grip: f32,
}

/// Slowly varying car and session description (typically every second).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StaticSessionInfo {
    pub player_name: String,
    pub player_surname: String,
    pub car_model: String,
    pub track: String,
    pub max_rpm: f32,
    pub max_fuel: f32,
    pub max_power: f32,
    pub max_turbo_boost: f32,
    pub has_ers: bool,
    pub has_kers: bool,
    pub has_drs: bool,
}
