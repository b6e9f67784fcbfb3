//! Versioned key tables for memory-feed records.
//!
//! The memory feed is produced by an external reader whose field names
//! depend on how it is built. Rather than probing several candidate keys per
//! sample, the adapter resolves one [`FieldMap`] when it is constructed.
//!
//! Tyre wear and dirt are not mapped: the readers disagree on which slots
//! carry them, so no mapping is assumed until one is documented.

use serde::{Deserialize, Serialize};

/// Naming scheme of the memory-feed collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Wrapper naming: signed gear, `engineTemp`, `kersMaxKJ`
    #[default]
    V1,
    /// Raw page naming: gear offset by one, `waterTemp`, `kersMaxJ`
    V2,
}

/// Record keys for one schema version.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    pub version: SchemaVersion,
    pub physics: PhysicsKeys,
    pub graphics: GraphicsKeys,
    pub static_info: StaticKeys,
    /// Added to the raw gear so that `-1` is reverse and `0` neutral
    pub gear_offset: i32,
    /// Multiplier turning the raw KERS capacity into kJ
    pub kers_max_scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsKeys {
    pub throttle: &'static str,
    pub brake: &'static str,
    pub clutch: &'static str,
    pub fuel: &'static str,
    pub gear: &'static str,
    pub rpm: &'static str,
    pub speed_kmh: &'static str,
    pub steer_angle: &'static str,
    pub acc_g: &'static str,
    pub tyre_core_temp: &'static str,
    pub tyre_pressure: &'static str,
    pub brake_temp: &'static str,
    pub brake_bias: &'static str,
    pub ride_height: &'static str,
    pub suspension_travel: &'static str,
    pub turbo_boost: &'static str,
    pub engine_temp: &'static str,
    pub air_temp: &'static str,
    pub road_temp: &'static str,
    pub abs_level: &'static str,
    pub abs_in_action: &'static str,
    pub tc_level: &'static str,
    pub tc_in_action: &'static str,
    pub auto_shifter: &'static str,
    pub pit_limiter: &'static str,
    pub ers_charging: &'static str,
    pub ers_recovery_level: &'static str,
    pub ers_power_level: &'static str,
    pub kers_current_kj: &'static str,
    pub kers_max: &'static str,
    pub kers_input: &'static str,
    pub drs: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsKeys {
    pub status: &'static str,
    pub session_type: &'static str,
    pub position: &'static str,
    pub completed_laps: &'static str,
    pub current_time: &'static str,
    pub last_time: &'static str,
    pub best_time: &'static str,
    pub delta_lap_time: &'static str,
    pub is_in_pit: &'static str,
    pub flag: &'static str,
    pub penalty: &'static str,
    pub tyre_compound: &'static str,
    pub rain_intensity: &'static str,
    pub track_grip: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticKeys {
    pub player_name: &'static str,
    pub player_surname: &'static str,
    pub car_model: &'static str,
    pub track: &'static str,
    pub max_rpm: &'static str,
    pub max_fuel: &'static str,
    pub max_power: &'static str,
    pub max_turbo_boost: &'static str,
    pub has_ers: &'static str,
    pub has_kers: &'static str,
    pub has_drs: &'static str,
}

const V1_PHYSICS: PhysicsKeys = PhysicsKeys {
    throttle: "gas",
    brake: "brake",
    clutch: "clutch",
    fuel: "fuel",
    gear: "gear",
    rpm: "rpms",
    speed_kmh: "speedKmh",
    steer_angle: "steerAngle",
    acc_g: "accG",
    tyre_core_temp: "tyreCoreTemperature",
    tyre_pressure: "wheelsPressure",
    brake_temp: "brakeTemp",
    brake_bias: "brakeBias",
    ride_height: "rideHeight",
    suspension_travel: "suspensionTravel",
    turbo_boost: "turboBoost",
    engine_temp: "engineTemp",
    air_temp: "airTemp",
    road_temp: "roadTemp",
    abs_level: "abs",
    abs_in_action: "absInAction",
    tc_level: "tc",
    tc_in_action: "tcinAction",
    auto_shifter: "autoShifterOn",
    pit_limiter: "pitLimiterOn",
    ers_charging: "ersIsCharging",
    ers_recovery_level: "ersRecoveryLevel",
    ers_power_level: "ersPowerLevel",
    kers_current_kj: "kersCurrentKJ",
    kers_max: "kersMaxKJ",
    kers_input: "kersInput",
    drs: "drs",
};

const V2_PHYSICS: PhysicsKeys = PhysicsKeys {
    engine_temp: "waterTemp",
    tc_in_action: "tcInAction",
    kers_max: "kersMaxJ",
    ..V1_PHYSICS
};

const GRAPHICS: GraphicsKeys = GraphicsKeys {
    status: "status",
    session_type: "session",
    position: "position",
    completed_laps: "completedLaps",
    current_time: "currentTime",
    last_time: "lastTime",
    best_time: "bestTime",
    delta_lap_time: "deltaLapTime",
    is_in_pit: "isInPit",
    flag: "flag",
    penalty: "penalty",
    tyre_compound: "tyreCompound",
    rain_intensity: "rainIntensity",
    track_grip: "trackGripStatus",
};

const STATIC: StaticKeys = StaticKeys {
    player_name: "playerName",
    player_surname: "playerSurname",
    car_model: "carModel",
    track: "track",
    max_rpm: "maxRpm",
    max_fuel: "maxFuel",
    max_power: "maxPower",
    max_turbo_boost: "maxTurboBoost",
    has_ers: "hasERS",
    has_kers: "hasKERS",
    has_drs: "hasDRS",
};

static V1: FieldMap = FieldMap {
    version: SchemaVersion::V1,
    physics: V1_PHYSICS,
    graphics: GRAPHICS,
    static_info: STATIC,
    gear_offset: 0,
    kers_max_scale: 1.0,
};

static V2: FieldMap = FieldMap {
    version: SchemaVersion::V2,
    physics: V2_PHYSICS,
    graphics: GRAPHICS,
    static_info: STATIC,
    gear_offset: -1,
    kers_max_scale: 0.001,
};

impl FieldMap {
    /// Key table for a schema version.
    pub fn for_version(version: SchemaVersion) -> &'static FieldMap {
        match version {
            SchemaVersion::V1 => &V1,
            SchemaVersion::V2 => &V2,
        }
    }
}
