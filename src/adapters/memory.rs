//! Memory-feed adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::field_map::{FieldMap, SchemaVersion};
use crate::sanitize::{array, flag, integer, number, sanitize, text, unit_interval, unsigned};
use crate::types::{
    CanonicalSample, GraphicsSample, MemoryFeedSample, PhysicsSample, StaticSessionInfo,
};

/// One record pushed by the memory-feed collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum MemoryRecord {
    Physics(Value),
    Graphics(Value),
    Static(Value),
}

/// Normalizes memory-feed records into [`MemoryFeedSample`]s.
///
/// The adapter keeps the latest normalized record of each kind so that every
/// canonical sample it emits carries physics, graphics and static data
/// together, whatever their individual cadences.
#[derive(Debug, Clone)]
pub struct MemoryFeedAdapter {
    fields: &'static FieldMap,
    latest: MemoryFeedSample,
}

impl MemoryFeedAdapter {
    pub fn new(version: SchemaVersion) -> Self {
        Self { fields: FieldMap::for_version(version), latest: MemoryFeedSample::default() }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.fields.version
    }

    /// Latest normalized state.
    pub fn latest(&self) -> &MemoryFeedSample {
        &self.latest
    }

    /// Normalize a record, replace the slot of its kind and return the
    /// resulting canonical sample.
    pub fn normalize(&mut self, record: &MemoryRecord) -> CanonicalSample {
        match record {
            MemoryRecord::Physics(raw) => self.latest.physics = Some(self.physics(raw)),
            MemoryRecord::Graphics(raw) => self.latest.graphics = Some(self.graphics(raw)),
            MemoryRecord::Static(raw) => self.latest.static_info = Some(self.static_info(raw)),
        }
        CanonicalSample::SharedMemory(self.latest.clone())
    }

    pub fn physics(&self, raw: &Value) -> PhysicsSample {
        let k = &self.fields.physics;
        let gear = integer(raw.get(k.gear)).saturating_add(i64::from(self.fields.gear_offset));
        PhysicsSample {
            throttle: unit_interval(raw.get(k.throttle)),
            brake: unit_interval(raw.get(k.brake)),
            clutch: unit_interval(raw.get(k.clutch)),
            fuel: number(raw.get(k.fuel)).max(0.0),
            gear: i32::try_from(gear).unwrap_or(0),
            rpm: number(raw.get(k.rpm)).max(0.0),
            speed_kmh: number(raw.get(k.speed_kmh)).max(0.0),
            steer_angle: number(raw.get(k.steer_angle)),
            acc_g: array(raw.get(k.acc_g)),
            tyre_core_temp: array(raw.get(k.tyre_core_temp)),
            tyre_pressure: array(raw.get(k.tyre_pressure)),
            brake_temp: array(raw.get(k.brake_temp)),
            brake_bias: unit_interval(raw.get(k.brake_bias)),
            ride_height: array(raw.get(k.ride_height)),
            suspension_travel: array(raw.get(k.suspension_travel)),
            turbo_boost: number(raw.get(k.turbo_boost)),
            engine_temp: number(raw.get(k.engine_temp)),
            air_temp: number(raw.get(k.air_temp)),
            road_temp: number(raw.get(k.road_temp)),
            abs_level: number(raw.get(k.abs_level)),
            abs_in_action: number(raw.get(k.abs_in_action)),
            tc_level: number(raw.get(k.tc_level)),
            tc_in_action: number(raw.get(k.tc_in_action)),
            auto_shifter: flag(raw.get(k.auto_shifter)),
            pit_limiter: flag(raw.get(k.pit_limiter)),
            ers_charging: flag(raw.get(k.ers_charging)),
            ers_recovery_level: number(raw.get(k.ers_recovery_level)),
            ers_power_level: number(raw.get(k.ers_power_level)),
            kers_current_kj: number(raw.get(k.kers_current_kj)),
            kers_max_kj: number(raw.get(k.kers_max)) * self.fields.kers_max_scale,
            kers_input: number(raw.get(k.kers_input)),
            drs: flag(raw.get(k.drs)),
        }
    }

    pub fn graphics(&self, raw: &Value) -> GraphicsSample {
        let k = &self.fields.graphics;
        GraphicsSample {
            status: small(raw.get(k.status)),
            session_type: i32::try_from(integer(raw.get(k.session_type))).unwrap_or(0),
            position: unsigned(raw.get(k.position)),
            completed_laps: unsigned(raw.get(k.completed_laps)),
            current_time: text(raw.get(k.current_time)),
            last_time: text(raw.get(k.last_time)),
            best_time: text(raw.get(k.best_time)),
            delta_lap_time: delta_seconds(raw.get(k.delta_lap_time)),
            is_in_pit: flag(raw.get(k.is_in_pit)),
            flag: small(raw.get(k.flag)),
            penalty: small(raw.get(k.penalty)),
            tyre_compound: text(raw.get(k.tyre_compound)),
            rain_intensity: unit_interval(raw.get(k.rain_intensity)),
            track_grip: unit_interval(raw.get(k.track_grip)),
        }
    }

    pub fn static_info(&self, raw: &Value) -> StaticSessionInfo {
        let k = &self.fields.static_info;
        StaticSessionInfo {
            player_name: text(raw.get(k.player_name)),
            player_surname: text(raw.get(k.player_surname)),
            car_model: text(raw.get(k.car_model)),
            track: text(raw.get(k.track)),
            max_rpm: number(raw.get(k.max_rpm)).max(0.0),
            max_fuel: number(raw.get(k.max_fuel)).max(0.0),
            max_power: number(raw.get(k.max_power)).max(0.0),
            max_turbo_boost: number(raw.get(k.max_turbo_boost)),
            has_ers: flag(raw.get(k.has_ers)),
            has_kers: flag(raw.get(k.has_kers)),
            has_drs: flag(raw.get(k.has_drs)),
        }
    }
}

fn small(value: Option<&Value>) -> u8 {
    u8::try_from(integer(value).clamp(0, i64::from(u8::MAX))).unwrap_or(0)
}

/// Delta to best lap in seconds. Some readers send it as text.
fn delta_seconds(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::String(s)) => {
            sanitize(s.as_str()).parse::<f32>().ok().map(crate::sanitize::finite_f32).unwrap_or(0.0)
        }
        other => number(other),
    }
}
