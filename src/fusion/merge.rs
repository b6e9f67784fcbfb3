//! The merge step: buffers and liveness in, snapshot out.
//!
//! [`merge`] is a pure function. It reads nothing but its arguments, so two
//! calls with the same inputs produce equal snapshots.

use crate::sanitize::{format_gear, parse_lap_time};
use crate::types::{
    ActiveProtocol, AidState, AidsData, BrakeData, BroadcastSample, CarIdentity, CarLocation,
    Confidence, ControlsData, DriverIdentity, EnergyData, EngineData, ErsState, GForceData,
    KersState, LapRecord, LapTimes, LivenessReport, MemoryFeedSample, MergedSnapshot, Motion,
    RealtimeData, SessionData, SourceId, Standing, SuspensionData, TrackData, TyreData,
};

use super::priority::{Category, Offer, PriorityTable};

/// Max RPM reported when the static record has none.
pub const DEFAULT_MAX_RPM: f32 = 8000.0;
/// Fuel capacity reported when the static record has none.
pub const DEFAULT_MAX_FUEL: f32 = 100.0;

/// Latest buffered sample of each source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buffers<'a> {
    pub memory: Option<&'a MemoryFeedSample>,
    pub broadcast: Option<&'a BroadcastSample>,
}

/// Build a snapshot from the current buffers.
pub fn merge(
    table: &PriorityTable,
    buffers: Buffers<'_>,
    liveness: &LivenessReport,
    generated_at_ms: u64,
) -> MergedSnapshot {
    let memory = buffers.memory.filter(|m| !m.is_empty());
    let broadcast = buffers.broadcast;
    let resolver = Resolver { table, liveness };

    let motion = resolver.pick_with_source(
        Category::Motion,
        memory.and_then(memory_motion),
        broadcast.and_then(|b| b.motion.clone()),
    );
    let standing = resolver.pick_with_source(
        Category::Standing,
        memory.and_then(memory_standing),
        broadcast.and_then(|b| b.standing.clone()),
    );

    let shared_memory_connected = liveness.shared_memory.connected;
    let broadcasting_connected = liveness.broadcasting.connected;

    MergedSnapshot {
        generated_at_ms,
        is_running: memory.is_some() || broadcast.is_some(),
        is_connected: shared_memory_connected || broadcasting_connected,
        active_protocol: ActiveProtocol::from_connections(
            shared_memory_connected,
            broadcasting_connected,
        ),
        liveness: liveness.clone(),
        car: resolver.pick(
            Category::CarIdentity,
            memory.and_then(memory_car),
            broadcast.and_then(|b| b.car.clone()),
        ),
        driver: resolver.pick(
            Category::DriverIdentity,
            memory.and_then(memory_driver),
            broadcast.and_then(|b| b.driver.clone()),
        ),
        realtime: realtime(motion, standing),
        engine: resolver.pick(
            Category::Engine,
            memory.and_then(memory_engine),
            broadcast.and_then(broadcast_engine),
        ),
        controls: resolver.pick(Category::Controls, memory.and_then(memory_controls), None),
        g_forces: resolver.pick(Category::GForces, memory.and_then(memory_g_forces), None),
        tyres: resolver.pick(Category::Tyres, memory.and_then(memory_tyres), None),
        brakes: resolver.pick(Category::Brakes, memory.and_then(memory_brakes), None),
        suspension: resolver.pick(Category::Suspension, memory.and_then(memory_suspension), None),
        aids: resolver.pick(Category::Aids, memory.and_then(memory_aids), None),
        energy: resolver.pick(Category::Energy, memory.and_then(memory_energy), None),
        lap_times: resolver.pick(
            Category::LapTimes,
            memory.and_then(memory_lap_times),
            broadcast.and_then(|b| b.lap_times.clone()),
        ),
        session: resolver.pick(
            Category::Session,
            memory.and_then(memory_session),
            broadcast.and_then(|b| b.session.clone()),
        ),
        track: resolver.pick(
            Category::Track,
            memory.and_then(memory_track),
            broadcast.and_then(|b| b.track.clone()),
        ),
        last_event: resolver.pick(
            Category::LastEvent,
            None,
            broadcast.and_then(|b| b.last_event.clone()),
        ),
        player: resolver.pick(Category::Player, None, broadcast.map(|b| b.player.clone())),
    }
}

struct Resolver<'a> {
    table: &'a PriorityTable,
    liveness: &'a LivenessReport,
}

/// A section that can report how it was obtained.
trait Section {
    fn confidence(&self) -> Confidence {
        Confidence::Structured
    }
}

impl Section for Motion {
    fn confidence(&self) -> Confidence {
        self.confidence
    }
}

macro_rules! structured_sections {
    ($($ty:ty),* $(,)?) => { $(impl Section for $ty {})* };
}

structured_sections!(
    CarIdentity,
    DriverIdentity,
    Standing,
    EngineData,
    ControlsData,
    GForceData,
    TyreData,
    BrakeData,
    SuspensionData,
    AidsData,
    EnergyData,
    LapTimes,
    SessionData,
    TrackData,
    crate::types::BroadcastingEvent,
    crate::types::PlayerInfo,
);

impl Resolver<'_> {
    fn pick<T: Section>(
        &self,
        category: Category,
        from_memory: Option<T>,
        from_broadcast: Option<T>,
    ) -> Option<T> {
        self.pick_with_source(category, from_memory, from_broadcast).map(|(_, section)| section)
    }

    fn pick_with_source<T: Section>(
        &self,
        category: Category,
        from_memory: Option<T>,
        from_broadcast: Option<T>,
    ) -> Option<(SourceId, T)> {
        let offer = |section: &Option<T>, source: SourceId| {
            section.as_ref().map(|s| Offer {
                quality_score: self.liveness.get(source).quality_score,
                confidence: s.confidence(),
            })
        };
        let chosen = self.table.resolve(category, |source| match source {
            SourceId::SharedMemory => offer(&from_memory, source),
            SourceId::Broadcasting => offer(&from_broadcast, source),
        })?;
        match chosen {
            SourceId::SharedMemory => from_memory,
            SourceId::Broadcasting => from_broadcast,
        }
        .map(|section| (chosen, section))
    }
}

fn realtime(
    motion: Option<(SourceId, Motion)>,
    standing: Option<(SourceId, Standing)>,
) -> RealtimeData {
    let mut data = RealtimeData::default();
    if let Some((source, motion)) = motion {
        data.speed_kmh = round_u32(motion.speed_kmh);
        data.gear = format_gear(motion.gear);
        data.rpm = motion.rpm.map_or(0, round_u32);
        data.motion_source = Some(source);
        data.motion_confidence = Some(motion.confidence);
    }
    if let Some((_, standing)) = standing {
        data.position = standing.position;
        data.cup_position = standing.cup_position;
        data.laps = standing.laps;
        data.delta_ms = standing.delta_ms;
        data.car_location = standing.car_location;
        data.world_position = standing.world_position;
        data.yaw = standing.yaw;
    }
    data
}

fn round_u32(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        // Saturating float-to-int cast.
        value.round() as u32
    } else {
        0
    }
}

fn memory_car(memory: &MemoryFeedSample) -> Option<CarIdentity> {
    let info = memory.static_info.as_ref()?;
    let team_name = format!("{} {}", info.player_name, info.player_surname).trim().to_owned();
    Some(CarIdentity { model: info.car_model.clone(), team_name, ..CarIdentity::default() })
}

fn memory_driver(memory: &MemoryFeedSample) -> Option<DriverIdentity> {
    let info = memory.static_info.as_ref()?;
    Some(DriverIdentity {
        first_name: info.player_name.clone(),
        last_name: info.player_surname.clone(),
        ..DriverIdentity::default()
    })
}

fn memory_motion(memory: &MemoryFeedSample) -> Option<Motion> {
    let physics = memory.physics.as_ref()?;
    Some(Motion {
        speed_kmh: physics.speed_kmh,
        gear: physics.gear,
        rpm: Some(physics.rpm),
        confidence: Confidence::Structured,
    })
}

fn memory_standing(memory: &MemoryFeedSample) -> Option<Standing> {
    let graphics = memory.graphics.as_ref()?;
    Some(Standing {
        position: graphics.position,
        laps: graphics.completed_laps,
        delta_ms: graphics.delta_lap_time * 1000.0,
        car_location: if graphics.is_in_pit { CarLocation::Pitlane } else { CarLocation::Track },
        ..Standing::default()
    })
}

fn memory_engine(memory: &MemoryFeedSample) -> Option<EngineData> {
    let physics = memory.physics.as_ref()?;
    let info = memory.static_info.as_ref();
    Some(EngineData {
        rpm: round_u32(physics.rpm),
        engine_temp: physics.engine_temp,
        turbo_boost: physics.turbo_boost,
        fuel: physics.fuel,
        max_rpm: info.map(|s| s.max_rpm).filter(|v| *v > 0.0).unwrap_or(DEFAULT_MAX_RPM),
        max_power: info.map_or(0.0, |s| s.max_power),
        max_fuel: info.map(|s| s.max_fuel).filter(|v| *v > 0.0).unwrap_or(DEFAULT_MAX_FUEL),
    })
}

fn broadcast_engine(broadcast: &BroadcastSample) -> Option<EngineData> {
    let rpm = broadcast.motion.as_ref()?.rpm?;
    Some(EngineData {
        rpm: round_u32(rpm),
        max_rpm: DEFAULT_MAX_RPM,
        max_fuel: DEFAULT_MAX_FUEL,
        ..EngineData::default()
    })
}

fn memory_controls(memory: &MemoryFeedSample) -> Option<ControlsData> {
    let physics = memory.physics.as_ref()?;
    Some(ControlsData {
        throttle: physics.throttle,
        brake: physics.brake,
        clutch: physics.clutch,
        steer_angle: physics.steer_angle,
    })
}

fn memory_g_forces(memory: &MemoryFeedSample) -> Option<GForceData> {
    let [lateral, vertical, longitudinal] = memory.physics.as_ref()?.acc_g;
    Some(GForceData { longitudinal, lateral, vertical })
}

fn memory_tyres(memory: &MemoryFeedSample) -> Option<TyreData> {
    let physics = memory.physics.as_ref()?;
    Some(TyreData {
        compound: memory.graphics.as_ref().map(|g| g.tyre_compound.clone()).unwrap_or_default(),
        core_temperatures: physics.tyre_core_temp,
        pressures: physics.tyre_pressure,
    })
}

fn memory_brakes(memory: &MemoryFeedSample) -> Option<BrakeData> {
    let physics = memory.physics.as_ref()?;
    Some(BrakeData { temperatures: physics.brake_temp, bias: physics.brake_bias })
}

fn memory_suspension(memory: &MemoryFeedSample) -> Option<SuspensionData> {
    let physics = memory.physics.as_ref()?;
    Some(SuspensionData { ride_height: physics.ride_height, travel: physics.suspension_travel })
}

fn memory_aids(memory: &MemoryFeedSample) -> Option<AidsData> {
    let physics = memory.physics.as_ref()?;
    Some(AidsData {
        abs: AidState { level: physics.abs_level, active: physics.abs_in_action },
        tc: AidState { level: physics.tc_level, active: physics.tc_in_action },
        auto_shifter: physics.auto_shifter,
        pit_limiter: physics.pit_limiter,
    })
}

fn memory_energy(memory: &MemoryFeedSample) -> Option<EnergyData> {
    let physics = memory.physics.as_ref();
    let info = memory.static_info.as_ref();
    if physics.is_none() && info.is_none() {
        return None;
    }
    Some(EnergyData {
        has_ers: info.is_some_and(|s| s.has_ers),
        has_kers: info.is_some_and(|s| s.has_kers),
        has_drs: info.is_some_and(|s| s.has_drs),
        ers: physics.map(|p| ErsState {
            is_charging: p.ers_charging,
            recovery_level: p.ers_recovery_level,
            power_level: p.ers_power_level,
        }),
        kers: physics.map(|p| KersState {
            current_kj: p.kers_current_kj,
            max_kj: p.kers_max_kj,
            input: p.kers_input,
        }),
        drs_active: physics.map(|p| p.drs),
    })
}

fn memory_lap_times(memory: &MemoryFeedSample) -> Option<LapTimes> {
    let graphics = memory.graphics.as_ref()?;
    Some(LapTimes {
        best: LapRecord::with_time(parse_lap_time(&graphics.best_time)),
        last: LapRecord::with_time(parse_lap_time(&graphics.last_time)),
        current: LapRecord::with_time(parse_lap_time(&graphics.current_time)),
    })
}

fn memory_session(memory: &MemoryFeedSample) -> Option<SessionData> {
    let graphics = memory.graphics.as_ref()?;
    let physics = memory.physics.as_ref();
    let wetness =
        if graphics.track_grip > 0.0 { (1.0 - graphics.track_grip).max(0.0) } else { 0.0 };
    Some(SessionData {
        session_type: graphics.session_type,
        phase: graphics.status,
        ambient_temp: physics.map_or(0.0, |p| p.air_temp),
        track_temp: physics.map_or(0.0, |p| p.road_temp),
        rain_level: graphics.rain_intensity,
        wetness,
        ..SessionData::default()
    })
}

fn memory_track(memory: &MemoryFeedSample) -> Option<TrackData> {
    let info = memory.static_info.as_ref()?;
    Some(TrackData { name: info.track.clone(), ..TrackData::default() })
}
