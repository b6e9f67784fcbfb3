//! Builders for datagrams and feed payloads used across tests and benches.
//!
//! The values here are fixed so assertions elsewhere can rely on them.

#![cfg(any(test, feature = "benchmark"))]

/// Broadcast datagrams in the layout [`crate::decoder`] reads.
///
/// Every builder pads its output to [`MIN_PACKET_LEN`] bytes.
pub mod packets {
    use crate::decoder::{MIN_PACKET_LEN, TEAM_NAME_CHARS, message_type};

    fn finish(mut data: Vec<u8>) -> Vec<u8> {
        if data.len() < MIN_PACKET_LEN {
            data.resize(MIN_PACKET_LEN, 0);
        }
        data
    }

    pub fn registration_result(connection_id: u32, success: bool) -> Vec<u8> {
        let mut data = vec![message_type::REGISTRATION_RESULT];
        data.extend_from_slice(&connection_id.to_le_bytes());
        data.push(u8::from(success));
        finish(data)
    }

    pub fn realtime_update(event_time: u32, session_type: u8, session_time: f32) -> Vec<u8> {
        let mut data = vec![message_type::REALTIME_UPDATE];
        data.extend_from_slice(&event_time.to_le_bytes());
        data.push(session_type);
        data.extend_from_slice(&session_time.to_le_bytes());
        finish(data)
    }

    pub fn car_update(car_id: u16, speed: f32, rpm: f32, gear: u8, position: [f32; 3]) -> Vec<u8> {
        let mut data = vec![message_type::CAR_UPDATE];
        data.extend_from_slice(&car_id.to_le_bytes());
        data.extend_from_slice(&speed.to_le_bytes());
        data.extend_from_slice(&rpm.to_le_bytes());
        data.push(gear);
        for axis in position {
            data.extend_from_slice(&axis.to_le_bytes());
        }
        finish(data)
    }

    pub fn entry_list(connection_id: u32, car_ids: &[u16]) -> Vec<u8> {
        let mut data = vec![message_type::ENTRY_LIST];
        data.extend_from_slice(&connection_id.to_le_bytes());
        let count = u16::try_from(car_ids.len()).unwrap_or(u16::MAX);
        data.extend_from_slice(&count.to_le_bytes());
        for id in car_ids {
            data.extend_from_slice(&id.to_le_bytes());
        }
        finish(data)
    }

    pub fn track_data(connection_id: u32, name: &str, track_id: i32, length_m: i32) -> Vec<u8> {
        let mut data = vec![message_type::TRACK_DATA];
        data.extend_from_slice(&connection_id.to_le_bytes());
        let len = u16::try_from(name.len()).unwrap_or(u16::MAX);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&name.as_bytes()[..usize::from(len)]);
        data.extend_from_slice(&track_id.to_le_bytes());
        data.extend_from_slice(&length_m.to_le_bytes());
        finish(data)
    }

    /// Team name is NUL-padded to the fixed field width.
    pub fn entry_list_car(car_id: u16, model_id: u8, team_name: &str) -> Vec<u8> {
        let mut data = vec![message_type::ENTRY_LIST_CAR];
        data.extend_from_slice(&car_id.to_le_bytes());
        data.push(model_id);
        let units = team_name.encode_utf16().chain(std::iter::repeat(0)).take(TEAM_NAME_CHARS);
        for unit in units {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        finish(data)
    }

    /// An unrecognized datagram with one float at `offset` and zeros elsewhere.
    pub fn generic(type_byte: u8, offset: usize, speed: f32) -> Vec<u8> {
        let mut data = vec![0u8; MIN_PACKET_LEN.max(offset + 4)];
        data[0] = type_byte;
        data[offset..offset + 4].copy_from_slice(&speed.to_le_bytes());
        data
    }
}

/// JSON payloads as the memory feed and a structured broadcast client
/// deliver them.
pub mod fixtures {
    use serde_json::{Value, json};

    /// A physics record using the default wrapper's key names.
    pub fn physics_json(gear: i64, speed_kmh: f64) -> Value {
        json!({
            "gas": 0.82,
            "brake": 0.0,
            "clutch": 0.0,
            "fuel": 54.3,
            "gear": gear,
            "rpms": 6500,
            "speedKmh": speed_kmh,
            "steerAngle": -0.04,
            "accG": [0.5, 1.0, -1.2],
            "tyreCoreTemperature": [80.0, 81.0, 82.0, 83.0],
            "wheelsPressure": [27.6, 27.7, 27.4, 27.5],
            "brakeTemp": [410.0, 415.0, 320.0, 318.0],
            "brakeBias": 0.56,
            "rideHeight": [0.052, 0.071],
            "suspensionTravel": [0.011, 0.012, 0.02, 0.021],
            "turboBoost": 0.0,
            "engineTemp": 91.0,
            "airTemp": 22.5,
            "roadTemp": 31.0,
            "abs": 3,
            "absInAction": 0.0,
            "tc": 2,
            "tcinAction": 0.0,
            "autoShifterOn": 0,
            "pitLimiterOn": true,
            "ersIsCharging": false,
            "ersRecoveryLevel": 0,
            "ersPowerLevel": 0,
            "kersCurrentKJ": 0.0,
            "kersMaxKJ": 0.0,
            "kersInput": 0.0,
            "drs": 0,
        })
    }

    pub fn graphics_json() -> Value {
        json!({
            "status": 2,
            "session": 2,
            "position": 5,
            "completedLaps": 3,
            "currentTime": "0:41.250",
            "lastTime": "1:48.913",
            "bestTime": "1:47.602",
            "deltaLapTime": "+0.310",
            "isInPit": false,
            "flag": 0,
            "penalty": 0,
            "tyreCompound": "dry_compound",
            "rainIntensity": 0.0,
            "trackGripStatus": 0.95,
        })
    }

    pub fn static_json() -> Value {
        json!({
            "playerName": "Ada",
            "playerSurname": "Lap",
            "carModel": "bmw_m4_gt3",
            "track": "monza",
            "maxRpm": 7800,
            "maxFuel": 120,
            "maxPower": 590,
            "maxTurboBoost": 0,
            "hasERS": 0,
            "hasKERS": 0,
            "hasDRS": 0,
        })
    }

    /// Session update focusing `focused_car`.
    pub fn realtime_update_json(focused_car: u16) -> Value {
        json!({
            "EventIndex": 1,
            "SessionIndex": 2,
            "SessionType": 10,
            "Phase": 5,
            "SessionTime": 612_000.0,
            "SessionEndTime": 1_188_000.0,
            "FocusedCarIndex": focused_car,
            "ActiveCameraSet": "Drivable",
            "ActiveCamera": "Chase",
            "CurrentHudPage": "Basic HUD",
            "IsReplayPlaying": false,
            "TimeOfDay": 50_400.0,
            "AmbientTemp": 22,
            "TrackTemp": 31,
            "Clouds": 0.1,
            "RainLevel": 0.0,
            "Wetness": 0.0,
        })
    }

    /// Car update placing `car_index` second, on track.
    pub fn car_update_json(car_index: u16, kmh: f64, gear: i64) -> Value {
        json!({
            "CarIndex": car_index,
            "DriverIndex": 0,
            "Gear": gear,
            "WorldPosX": 120.5,
            "WorldPosY": -48.25,
            "Yaw": 1.2,
            "CarLocation": 1,
            "Kmh": kmh,
            "Position": 2,
            "CupPosition": 2,
            "TrackPosition": 2,
            "SplinePosition": 0.42,
            "Laps": 3,
            "Delta": -120,
        })
    }

    pub fn entry_list_car_json(car_index: u16) -> Value {
        json!({
            "CarIndex": car_index,
            "CarModelType": 30,
            "TeamName": "Slipstream Racing",
            "RaceNumber": 42,
            "CupCategory": 0,
            "Nationality": 0,
            "CurrentDriver": {
                "FirstName": "Ada",
                "LastName": "Lap",
                "ShortName": "LAP",
                "Category": 2,
                "Nationality": 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::MIN_PACKET_LEN;

    #[test]
    fn packets_meet_minimum_length() {
        assert!(packets::registration_result(1, true).len() >= MIN_PACKET_LEN);
        assert!(packets::car_update(1, 1.0, 1.0, 1, [0.0; 3]).len() >= MIN_PACKET_LEN);
        assert_eq!(packets::entry_list_car(1, 1, "x").len(), 104);
        assert_eq!(packets::generic(9, 32, 1.0).len(), 36);
    }
}
