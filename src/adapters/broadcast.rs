//! Broadcast-feed adapter.
//!
//! The broadcast feed reaches the adapter in one of two shapes: named events
//! from a structured client, with PascalCase JSON payloads, or datagrams
//! decoded by [`crate::decoder`]. Both update the same [`BroadcastSample`].
//!
//! Only the player's car contributes motion, standing and lap records. The
//! player car is identified from the focused car index when the session
//! reports one, otherwise from the only car seen so far, otherwise from the
//! first car of the entry list. Identification happens once.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::decoder::{
    CarUpdate, ControlMessage, DecodedPacket, EntryListCar, GenericSample, RealtimeUpdate,
    TelemetryRecord,
};
use crate::sanitize::{flag, integer, number, optional_integer, text, unsigned};
use crate::types::{
    BroadcastSample, BroadcastingEvent, CanonicalSample, CarIdentity, CarLocation, Confidence,
    DriverIdentity, LapRecord, LapTimes, Motion, PlayerInfo, SessionData, Standing, TrackData,
};

/// Named event from a structured broadcast client.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastEvent {
    RegistrationResult { success: bool, message: String },
    RealtimeUpdate(Value),
    RealtimeCarUpdate(Value),
    /// Car indices of the entry list, in list order
    EntryList(Vec<u16>),
    EntryListCar(Value),
    TrackData(Value),
    BroadcastingEvent(Value),
    Disconnect,
}

impl BroadcastEvent {
    /// Build an event from the client's event name and payload.
    ///
    /// Returns `None` for names outside the protocol.
    pub fn from_named(name: &str, payload: Value) -> Option<Self> {
        let event = match name {
            "registration_result" => BroadcastEvent::RegistrationResult {
                success: flag(payload.get("ConnectionSuccess")),
                message: text(payload.get("errMsg")),
            },
            "realtime_update" => BroadcastEvent::RealtimeUpdate(payload),
            "realtime_car_update" => BroadcastEvent::RealtimeCarUpdate(payload),
            "entry_list" => BroadcastEvent::EntryList(entry_list_indices(&payload)),
            "entry_list_car" => BroadcastEvent::EntryListCar(payload),
            "track_data" => BroadcastEvent::TrackData(payload),
            "broadcasting_event" => BroadcastEvent::BroadcastingEvent(payload),
            "disconnect" => BroadcastEvent::Disconnect,
            _ => return None,
        };
        Some(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::RegistrationResult { .. } => "registration_result",
            BroadcastEvent::RealtimeUpdate(_) => "realtime_update",
            BroadcastEvent::RealtimeCarUpdate(_) => "realtime_car_update",
            BroadcastEvent::EntryList(_) => "entry_list",
            BroadcastEvent::EntryListCar(_) => "entry_list_car",
            BroadcastEvent::TrackData(_) => "track_data",
            BroadcastEvent::BroadcastingEvent(_) => "broadcasting_event",
            BroadcastEvent::Disconnect => "disconnect",
        }
    }
}

/// Anything the broadcast source can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastInput {
    Event(BroadcastEvent),
    Packet(DecodedPacket),
}

impl From<BroadcastEvent> for BroadcastInput {
    fn from(event: BroadcastEvent) -> Self {
        BroadcastInput::Event(event)
    }
}

impl From<DecodedPacket> for BroadcastInput {
    fn from(packet: DecodedPacket) -> Self {
        BroadcastInput::Packet(packet)
    }
}

/// What applying one input means for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastOutcome {
    /// Data arrived; the sample is the adapter's new latest view
    Sample(CanonicalSample),
    /// The feed reported that it is gone
    Disconnected,
    /// Bookkeeping only, no data
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CarSighting {
    position: u32,
    speed_kmh: f32,
}

/// Normalizes broadcast events and decoded datagrams.
#[derive(Debug, Clone, Default)]
pub struct BroadcastFeedAdapter {
    latest: BroadcastSample,
    cars: BTreeMap<u16, CarSighting>,
    focused_car: Option<u16>,
}

impl BroadcastFeedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> &BroadcastSample {
        &self.latest
    }

    pub fn player_car(&self) -> Option<u16> {
        self.latest.player.car_index
    }

    /// Apply one input and report its effect.
    pub fn apply(&mut self, input: &BroadcastInput) -> BroadcastOutcome {
        match input {
            BroadcastInput::Event(event) => self.apply_event(event),
            BroadcastInput::Packet(packet) => self.apply_packet(packet),
        }
    }

    pub fn apply_event(&mut self, event: &BroadcastEvent) -> BroadcastOutcome {
        trace!(event = event.name(), "broadcast event");
        match event {
            BroadcastEvent::RegistrationResult { success: true, .. } => {
                debug!("broadcast registration accepted");
                return BroadcastOutcome::Ignored;
            }
            BroadcastEvent::RegistrationResult { success: false, message } => {
                debug!(reason = %message, "broadcast registration rejected");
                return BroadcastOutcome::Disconnected;
            }
            BroadcastEvent::Disconnect => return BroadcastOutcome::Disconnected,
            BroadcastEvent::RealtimeUpdate(raw) => self.realtime_update(raw),
            BroadcastEvent::RealtimeCarUpdate(raw) => self.realtime_car_update(raw),
            BroadcastEvent::EntryList(cars) => self.entry_list(cars),
            BroadcastEvent::EntryListCar(raw) => self.entry_list_car(raw),
            BroadcastEvent::TrackData(raw) => {
                self.latest.track = Some(TrackData {
                    name: text(raw.get("TrackName")),
                    track_id: optional_integer(raw.get("TrackId")).and_then(|v| u32::try_from(v).ok()),
                    length_m: optional_integer(raw.get("TrackMeters"))
                        .and_then(|v| u32::try_from(v).ok()),
                });
            }
            BroadcastEvent::BroadcastingEvent(raw) => {
                self.latest.last_event = Some(BroadcastingEvent {
                    kind: u8::try_from(integer(raw.get("Type"))).unwrap_or(0),
                    message: text(raw.get("Msg")),
                    time_ms: integer(raw.get("TimeMs")),
                    car_id: integer(raw.get("CarId")),
                });
            }
        }
        self.emit()
    }

    pub fn apply_packet(&mut self, packet: &DecodedPacket) -> BroadcastOutcome {
        match packet {
            DecodedPacket::Telemetry(TelemetryRecord::Realtime(update)) => {
                self.decoded_realtime(update)
            }
            DecodedPacket::Telemetry(TelemetryRecord::Car(car)) => self.decoded_car(car),
            DecodedPacket::Telemetry(TelemetryRecord::EntryListCar(car)) => {
                self.decoded_entry_car(car)
            }
            DecodedPacket::Telemetry(TelemetryRecord::Generic(sample)) => self.heuristic(sample),
            DecodedPacket::Control(ControlMessage::RegistrationResult { success: true, .. }) => {
                return BroadcastOutcome::Ignored;
            }
            DecodedPacket::Control(ControlMessage::RegistrationResult { success: false, .. }) => {
                return BroadcastOutcome::Disconnected;
            }
            DecodedPacket::Control(ControlMessage::EntryList { car_ids, .. }) => {
                debug!(cars = car_ids.len(), "entry list received");
                self.entry_list(car_ids);
            }
            DecodedPacket::Control(ControlMessage::TrackData { name, track_id, length_m, .. }) => {
                debug!(track = %name, "track data received");
                self.latest.track = Some(TrackData {
                    name: name.clone(),
                    track_id: u32::try_from(*track_id).ok(),
                    length_m: u32::try_from(*length_m).ok(),
                });
            }
        }
        self.emit()
    }

    fn emit(&mut self) -> BroadcastOutcome {
        self.latest.player.all_cars_count = u32::try_from(self.cars.len()).unwrap_or(u32::MAX);
        BroadcastOutcome::Sample(CanonicalSample::Broadcasting(self.latest.clone()))
    }

    fn identify(&mut self, car_index: u16) {
        debug!(car_index, "player car identified");
        self.latest.player = PlayerInfo {
            car_index: Some(car_index),
            identified: true,
            all_cars_count: self.latest.player.all_cars_count,
        };
    }

    fn is_player_car(&mut self, car_index: u16) -> bool {
        if !self.latest.player.identified {
            if let Some(focused) = self.focused_car {
                self.identify(focused);
            } else if self.cars.len() == 1 && self.cars.contains_key(&car_index) {
                self.identify(car_index);
            }
        }
        self.latest.player.car_index == Some(car_index)
    }

    fn realtime_update(&mut self, raw: &Value) {
        let focused = optional_integer(raw.get("FocusedCarIndex")).and_then(|v| u16::try_from(v).ok());
        self.focused_car = focused;
        if let (false, Some(index)) = (self.latest.player.identified, focused) {
            self.identify(index);
        }

        self.latest.session = Some(SessionData {
            session_type: i32::try_from(integer(raw.get("SessionType"))).unwrap_or(0),
            phase: u8::try_from(integer(raw.get("Phase"))).unwrap_or(0),
            event_index: unsigned(raw.get("EventIndex")),
            session_index: unsigned(raw.get("SessionIndex")),
            session_time_ms: number(raw.get("SessionTime")),
            session_end_time_ms: number(raw.get("SessionEndTime")),
            time_of_day_ms: number(raw.get("TimeOfDay")),
            focused_car_index: focused,
            active_camera_set: text(raw.get("ActiveCameraSet")),
            active_camera: text(raw.get("ActiveCamera")),
            current_hud_page: text(raw.get("CurrentHudPage")),
            is_replay_playing: flag(raw.get("IsReplayPlaying")),
            ambient_temp: number(raw.get("AmbientTemp")),
            track_temp: number(raw.get("TrackTemp")),
            clouds: number(raw.get("Clouds")).clamp(0.0, 1.0),
            rain_level: number(raw.get("RainLevel")).clamp(0.0, 1.0),
            wetness: number(raw.get("Wetness")).clamp(0.0, 1.0),
        });

        if let Some(best) = raw.get("BestSessionLap").filter(|v| v.is_object()) {
            self.lap_times_mut().best = lap_record(best);
        }
    }

    fn realtime_car_update(&mut self, raw: &Value) {
        let Some(car_index) =
            optional_integer(raw.get("CarIndex")).and_then(|v| u16::try_from(v).ok())
        else {
            return;
        };

        let motion = Motion {
            speed_kmh: number(raw.get("Kmh")).max(0.0),
            gear: i32::try_from(integer(raw.get("Gear"))).unwrap_or(0),
            rpm: None,
            confidence: Confidence::Structured,
        };
        let position = unsigned(raw.get("Position"));
        self.cars.insert(
            car_index,
            CarSighting { position, speed_kmh: motion.speed_kmh },
        );
        if !self.is_player_car(car_index) {
            return;
        }

        self.latest.motion = Some(motion);
        self.latest.standing = Some(Standing {
            position,
            cup_position: unsigned(raw.get("CupPosition")),
            track_position: unsigned(raw.get("TrackPosition")),
            spline_position: number(raw.get("SplinePosition")),
            laps: unsigned(raw.get("Laps")),
            delta_ms: number(raw.get("Delta")),
            car_location: car_location(raw.get("CarLocation")),
            world_position: [number(raw.get("WorldPosX")), number(raw.get("WorldPosY")), 0.0],
            yaw: number(raw.get("Yaw")),
        });

        for (key, slot) in [("BestSessionLap", 0), ("LastLap", 1), ("CurrentLap", 2)] {
            if let Some(lap) = raw.get(key).filter(|v| v.is_object()) {
                let record = lap_record(lap);
                let laps = self.lap_times_mut();
                match slot {
                    0 => laps.best = record,
                    1 => laps.last = record,
                    _ => laps.current = record,
                }
            }
        }
    }

    fn entry_list(&mut self, cars: &[u16]) {
        if self.latest.player.identified {
            return;
        }
        if let Some(index) = self.focused_car.or_else(|| cars.first().copied()) {
            self.identify(index);
        }
    }

    fn entry_list_car(&mut self, raw: &Value) {
        let Some(car_index) =
            optional_integer(raw.get("CarIndex")).and_then(|v| u16::try_from(v).ok())
        else {
            return;
        };
        if !self.is_player_car(car_index) {
            return;
        }

        self.latest.car = Some(CarIdentity {
            model: String::new(),
            model_id: optional_integer(raw.get("CarModelType")).and_then(|v| u8::try_from(v).ok()),
            team_name: text(raw.get("TeamName")),
            race_number: i32::try_from(integer(raw.get("RaceNumber"))).unwrap_or(0),
            cup_category: optional_integer(raw.get("CupCategory")).and_then(|v| u8::try_from(v).ok()),
            nationality: optional_integer(raw.get("Nationality")).and_then(|v| u16::try_from(v).ok()),
        });

        if let Some(driver) = raw.get("CurrentDriver").filter(|v| v.is_object()) {
            self.latest.driver = Some(DriverIdentity {
                first_name: text(driver.get("FirstName")),
                last_name: text(driver.get("LastName")),
                short_name: text(driver.get("ShortName")),
                category: optional_integer(driver.get("Category")).and_then(|v| u8::try_from(v).ok()),
                nationality: optional_integer(driver.get("Nationality"))
                    .and_then(|v| u16::try_from(v).ok()),
            });
        }
    }

    /// The datagram only carries the session clock, so it refreshes a
    /// session a structured update already reported and never creates one.
    fn decoded_realtime(&mut self, update: &RealtimeUpdate) {
        if let Some(session) = self.latest.session.as_mut() {
            session.session_type = i32::from(update.session_type);
            session.session_time_ms = update.session_time;
        }
    }

    fn decoded_car(&mut self, car: &CarUpdate) {
        let gear = i32::from(car.gear);
        let previous = self.cars.get(&car.car_id).copied();
        let speed_kmh = car.speed_kmh.or(previous.map(|p| p.speed_kmh)).unwrap_or(0.0);
        self.cars.insert(
            car.car_id,
            CarSighting { position: previous.map_or(0, |p| p.position), speed_kmh },
        );
        if !self.is_player_car(car.car_id) {
            return;
        }

        if self.latest.motion_confidence() > Some(Confidence::Decoded) {
            trace!(car_id = car.car_id, "decoded motion ignored, structured data present");
        } else {
            let rpm = car.rpm.or_else(|| self.latest.motion.as_ref().and_then(|m| m.rpm));
            self.latest.motion = Some(Motion { speed_kmh, gear, rpm, confidence: Confidence::Decoded });
        }
        // No position or laps on the wire: patch a reported standing only.
        if let Some(standing) = self.latest.standing.as_mut() {
            standing.world_position = car.world_position;
        }
    }

    fn decoded_entry_car(&mut self, entry: &EntryListCar) {
        if !self.is_player_car(entry.car_id) {
            return;
        }
        let car = self.latest.car.get_or_insert_with(CarIdentity::default);
        car.model_id = Some(entry.model_id);
        car.team_name = entry.team_name.clone();
    }

    fn heuristic(&mut self, sample: &GenericSample) {
        if self.latest.motion_confidence() > Some(Confidence::Heuristic) {
            trace!(offset = sample.offset, "heuristic speed ignored");
            return;
        }
        self.latest.motion = Some(Motion {
            speed_kmh: sample.speed_kmh,
            gear: 0,
            rpm: None,
            confidence: Confidence::Heuristic,
        });
    }

    fn lap_times_mut(&mut self) -> &mut LapTimes {
        self.latest.lap_times.get_or_insert_with(LapTimes::default)
    }
}

/// Broadcast lap time: non-positive values and `i32::MAX` mean "no time".
fn lap_time(value: Option<&Value>) -> Option<u32> {
    optional_integer(value)
        .filter(|&ms| ms > 0 && ms < i64::from(i32::MAX))
        .and_then(|ms| u32::try_from(ms).ok())
}

fn lap_record(raw: &Value) -> LapRecord {
    let mut splits = [None; 3];
    if let Some(Value::Array(items)) = raw.get("Splits") {
        for (slot, item) in splits.iter_mut().zip(items) {
            *slot = lap_time(Some(item));
        }
    }
    LapRecord {
        laptime_ms: lap_time(raw.get("LaptimeMS")),
        splits,
        is_valid_for_best: flag(raw.get("IsValidForBest")),
        is_invalid: flag(raw.get("IsInvalid")),
    }
}

fn car_location(value: Option<&Value>) -> CarLocation {
    match value {
        Some(Value::String(name)) => match name.as_str() {
            "Track" => CarLocation::Track,
            "Pitlane" => CarLocation::Pitlane,
            "PitEntry" => CarLocation::PitEntry,
            "PitExit" => CarLocation::PitExit,
            _ => CarLocation::Unknown,
        },
        other => CarLocation::from_code(integer(other)),
    }
}

fn entry_list_indices(payload: &Value) -> Vec<u16> {
    let index = |v: &Value| -> Option<u16> {
        let raw = if v.is_object() { v.get("CarIndex") } else { Some(v) };
        optional_integer(raw).and_then(|i| u16::try_from(i).ok())
    };
    match payload {
        Value::Array(items) => items.iter().filter_map(index).collect(),
        Value::Object(map) => map.keys().filter_map(|k| k.parse().ok()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixtures, packets};

    use serde_json::json;

    fn sample(outcome: BroadcastOutcome) -> BroadcastSample {
        match outcome {
            BroadcastOutcome::Sample(CanonicalSample::Broadcasting(sample)) => sample,
            other => panic!("expected a broadcast sample, got {other:?}"),
        }
    }

    fn packet(data: &[u8]) -> BroadcastInput {
        BroadcastInput::Packet(crate::decoder::decode(data).unwrap())
    }

    #[test]
    fn focused_car_identifies_player() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply_event(&BroadcastEvent::RealtimeUpdate(fixtures::realtime_update_json(7)));
        assert_eq!(adapter.player_car(), Some(7));

        let other = sample(adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(
            fixtures::car_update_json(3, 200.0, 5),
        )));
        assert!(other.motion.is_none());
        assert_eq!(other.player.all_cars_count, 1);

        let player = sample(adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(
            fixtures::car_update_json(7, 143.4, 4),
        )));
        let motion = player.motion.unwrap();
        assert_eq!(motion.gear, 4);
        assert_eq!(motion.confidence, Confidence::Structured);
        assert_eq!(player.standing.map(|s| s.position), Some(2));
        assert_eq!(player.player.all_cars_count, 2);
    }

    #[test]
    fn single_car_seen_becomes_player() {
        let mut adapter = BroadcastFeedAdapter::new();
        let update = sample(adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(
            fixtures::car_update_json(11, 99.0, 3),
        )));
        assert_eq!(update.player.car_index, Some(11));
        assert!(update.player.identified);
        assert!(update.motion.is_some());
    }

    #[test]
    fn entry_list_falls_back_to_first_car() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply_event(&BroadcastEvent::EntryList(vec![4, 9, 2]));
        assert_eq!(adapter.player_car(), Some(4));

        adapter.apply_event(&BroadcastEvent::EntryList(vec![9]));
        assert_eq!(adapter.player_car(), Some(4));
    }

    #[test]
    fn lap_records_map_sentinels_to_none() {
        let mut adapter = BroadcastFeedAdapter::new();
        let mut raw = fixtures::car_update_json(1, 120.0, 3);
        raw["LastLap"] = json!({
            "LaptimeMS": 83456,
            "Splits": [27000, null, 2147483647],
            "IsValidForBest": true,
            "IsInvalid": false,
        });
        raw["CurrentLap"] = json!({ "LaptimeMS": 0 });
        let laps = sample(adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(raw)))
            .lap_times
            .unwrap();
        assert_eq!(laps.last.laptime_ms, Some(83456));
        assert_eq!(laps.last.splits, [Some(27000), None, None]);
        assert!(laps.last.is_valid_for_best);
        assert_eq!(laps.current.laptime_ms, None);
    }

    #[test]
    fn entry_list_car_fills_identities_for_player_only() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply_event(&BroadcastEvent::EntryList(vec![5]));
        let mut other = fixtures::entry_list_car_json(6);
        other["TeamName"] = json!("Someone Else");
        let result = sample(adapter.apply_event(&BroadcastEvent::EntryListCar(other)));
        assert!(result.car.is_none());

        let result =
            sample(adapter.apply_event(&BroadcastEvent::EntryListCar(fixtures::entry_list_car_json(5))));
        let car = result.car.unwrap();
        assert_eq!(car.team_name, "Slipstream Racing");
        assert_eq!(car.model_id, Some(30));
        assert_eq!(car.race_number, 42);
        assert_eq!(result.driver.map(|d| d.short_name), Some("LAP".to_string()));
    }

    #[test]
    fn control_events_report_disconnects() {
        let mut adapter = BroadcastFeedAdapter::new();
        let rejected = BroadcastEvent::from_named(
            "registration_result",
            json!({ "ConnectionSuccess": false, "errMsg": "bad password" }),
        )
        .unwrap();
        assert_eq!(adapter.apply_event(&rejected), BroadcastOutcome::Disconnected);
        assert_eq!(adapter.apply_event(&BroadcastEvent::Disconnect), BroadcastOutcome::Disconnected);

        let accepted =
            BroadcastEvent::from_named("registration_result", json!({ "ConnectionSuccess": true }))
                .unwrap();
        assert_eq!(adapter.apply_event(&accepted), BroadcastOutcome::Ignored);
        assert!(BroadcastEvent::from_named("pit_stop", Value::Null).is_none());
    }

    #[test]
    fn entry_list_payload_shapes() {
        assert_eq!(entry_list_indices(&json!([1, 2, 3])), vec![1, 2, 3]);
        assert_eq!(entry_list_indices(&json!([{ "CarIndex": 8 }, { "Other": 1 }])), vec![8]);
        assert_eq!(entry_list_indices(&json!({ "12": {}, "3": {} })), vec![12, 3]);
        assert!(entry_list_indices(&Value::Null).is_empty());
    }

    #[test]
    fn track_and_broadcasting_events() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply_event(&BroadcastEvent::TrackData(json!({
            "TrackName": "monza", "TrackId": 21, "TrackMeters": 5793
        })));
        let result = sample(adapter.apply_event(&BroadcastEvent::BroadcastingEvent(json!({
            "Type": 6, "Msg": "Best lap", "TimeMs": 61000, "CarId": 7
        }))));
        assert_eq!(result.track.map(|t| t.length_m), Some(Some(5793)));
        assert_eq!(result.last_event.map(|e| e.kind), Some(6));
    }

    #[test]
    fn decoded_car_update_sets_decoded_motion() {
        let mut adapter = BroadcastFeedAdapter::new();
        let result = sample(adapter.apply(&packet(&packets::car_update(3, 151.2, 7100.0, 5, [1.0, 2.0, 3.0]))));
        let motion = result.motion.unwrap();
        assert_eq!(motion.confidence, Confidence::Decoded);
        assert_eq!(motion.rpm, Some(7100.0));
        assert!(result.standing.is_none());
        assert!(result.session.is_none());
    }

    #[test]
    fn datagrams_patch_only_reported_sections() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply(&packet(&packets::realtime_update(3, 4, 91_000.0)));
        assert!(adapter.latest().session.is_none());

        adapter.apply_event(&BroadcastEvent::RealtimeUpdate(fixtures::realtime_update_json(3)));
        adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(fixtures::car_update_json(3, 120.0, 3)));
        adapter.apply(&packet(&packets::car_update(3, 151.2, 7100.0, 5, [1.0, 2.0, 3.0])));
        let standing = adapter.latest().standing.clone().unwrap();
        assert_eq!(standing.world_position, [1.0, 2.0, 3.0]);
        assert_eq!(standing.position, 2);
    }

    #[test]
    fn lower_confidence_never_replaces_higher() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply_event(&BroadcastEvent::RealtimeCarUpdate(fixtures::car_update_json(3, 120.0, 3)));

        adapter.apply(&packet(&packets::generic(0x40, 4, 250.0)));
        assert_eq!(adapter.latest().motion_confidence(), Some(Confidence::Structured));

        adapter.apply(&packet(&packets::car_update(3, 151.2, 7100.0, 5, [0.0; 3])));
        let motion = adapter.latest().motion.clone().unwrap();
        assert_eq!(motion.confidence, Confidence::Structured);
        assert_eq!(motion.speed_kmh, 120.0);
    }

    #[test]
    fn heuristic_fills_empty_motion() {
        let mut adapter = BroadcastFeedAdapter::new();
        let result = sample(adapter.apply(&packet(&packets::generic(0x40, 12, 77.5))));
        let motion = result.motion.unwrap();
        assert_eq!(motion.confidence, Confidence::Heuristic);
        assert_eq!(motion.speed_kmh, 77.5);
    }

    #[test]
    fn decoded_control_messages() {
        let mut adapter = BroadcastFeedAdapter::new();
        adapter.apply(&packet(&packets::entry_list(1, &[6, 2])));
        assert_eq!(adapter.player_car(), Some(6));

        let result = sample(adapter.apply(&packet(&packets::track_data(1, "Imola", 3, 4959))));
        assert_eq!(result.track.map(|t| t.name), Some("Imola".to_string()));

        let failed = packet(&packets::registration_result(1, false));
        assert_eq!(adapter.apply(&failed), BroadcastOutcome::Disconnected);
    }
}
