//! Binary decoder for broadcast datagrams.
//!
//! The wire format is not self-describing. The first byte selects the
//! message type and the payload follows at fixed offsets:
//!
//! | Type | Message | Payload after the type byte |
//! |---|---|---|
//! | 0 | registration result | `u32` connection id, `u8` success |
//! | 1 | realtime update | `u32` event time, `u8` session type, `f32` session time |
//! | 2 | car update | `u16` car id, `f32` speed, `f32` rpm, `u8` gear, `f32`×3 position |
//! | 3 | entry list | `u32` connection id, `u16` count, `u16` car ids |
//! | 4 | track data | `u32` connection id, `u16`-prefixed name, `i32` id, `i32` meters |
//! | 5 | entry-list car | `u16` car id, `u8` model, 50 UTF-16LE code units team name |
//!
//! Any other type byte goes to the [`heuristic`] scan. Datagrams shorter
//! than [`MIN_PACKET_LEN`] are dropped.
//!
//! ```rust
//! use slipstream::decoder::{BinaryPacketDecoder, DecodedPacket, TelemetryRecord};
//!
//! let mut datagram = vec![0u8; 32];
//! datagram[0] = 2;
//! datagram[3..7].copy_from_slice(&142.5f32.to_le_bytes());
//! datagram[7..11].copy_from_slice(&6800.0f32.to_le_bytes());
//! datagram[11] = 4;
//!
//! match BinaryPacketDecoder::new().decode(&datagram) {
//!     Some(DecodedPacket::Telemetry(TelemetryRecord::Car(car))) => {
//!         assert_eq!(car.speed_kmh, Some(142.5));
//!         assert_eq!(car.gear, 4);
//!     }
//!     other => panic!("unexpected decode: {other:?}"),
//! }
//! ```

pub mod heuristic;
mod wire;

use crate::types::Confidence;
use heuristic::plausible_speed;
pub use heuristic::GenericSample;
use wire::WireReader;

/// Minimum length of a datagram worth decoding.
pub const MIN_PACKET_LEN: usize = 32;

/// Highest RPM accepted from a car update.
pub const MAX_PLAUSIBLE_RPM: f32 = 25_000.0;

/// Width of the team-name field in an entry-list car, in UTF-16 code units.
pub const TEAM_NAME_CHARS: usize = 50;

/// Message type discriminators.
pub mod message_type {
    pub const REGISTRATION_RESULT: u8 = 0;
    pub const REALTIME_UPDATE: u8 = 1;
    pub const CAR_UPDATE: u8 = 2;
    pub const ENTRY_LIST: u8 = 3;
    pub const TRACK_DATA: u8 = 4;
    pub const ENTRY_LIST_CAR: u8 = 5;
}

/// Session clock update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealtimeUpdate {
    pub event_time: u32,
    pub session_type: u8,
    /// Always finite
    pub session_time: f32,
}

/// Per-car motion update. A field outside its plausible range is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarUpdate {
    pub car_id: u16,
    pub speed_kmh: Option<f32>,
    pub rpm: Option<f32>,
    pub gear: u8,
    pub world_position: [f32; 3],
}

/// Static description of one car in the entry list.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryListCar {
    pub car_id: u16,
    pub model_id: u8,
    pub team_name: String,
}

/// Telemetry carried by a datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    Realtime(RealtimeUpdate),
    Car(CarUpdate),
    EntryListCar(EntryListCar),
    /// Guessed from an unrecognized datagram
    Generic(GenericSample),
}

impl TelemetryRecord {
    pub fn confidence(&self) -> Confidence {
        match self {
            TelemetryRecord::Generic(_) => Confidence::Heuristic,
            _ => Confidence::Decoded,
        }
    }
}

/// Protocol bookkeeping consumed by the listener itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    RegistrationResult { connection_id: u32, success: bool },
    EntryList { connection_id: u32, car_ids: Vec<u16> },
    TrackData { connection_id: u32, name: String, track_id: i32, length_m: i32 },
}

/// Result of decoding one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPacket {
    Telemetry(TelemetryRecord),
    Control(ControlMessage),
}

impl DecodedPacket {
    /// Confidence of the telemetry carried, `None` for control messages.
    pub fn confidence(&self) -> Option<Confidence> {
        match self {
            DecodedPacket::Telemetry(record) => Some(record.confidence()),
            DecodedPacket::Control(_) => None,
        }
    }
}

/// Stateless datagram decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryPacketDecoder;

impl BinaryPacketDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one datagram, or `None` when it is too short or carries
    /// nothing plausible.
    pub fn decode(&self, data: &[u8]) -> Option<DecodedPacket> {
        decode(data)
    }
}

/// Decode one datagram. See [`BinaryPacketDecoder::decode`].
pub fn decode(data: &[u8]) -> Option<DecodedPacket> {
    if data.len() < MIN_PACKET_LEN {
        return None;
    }

    let mut reader = WireReader::new(data);
    let kind = reader.read_u8()?;
    match kind {
        message_type::REGISTRATION_RESULT => {
            let connection_id = reader.read_u32_le()?;
            let success = reader.read_u8()? != 0;
            Some(DecodedPacket::Control(ControlMessage::RegistrationResult { connection_id, success }))
        }
        message_type::REALTIME_UPDATE => {
            let event_time = reader.read_u32_le()?;
            let session_type = reader.read_u8()?;
            let session_time = crate::sanitize::finite_f32(reader.read_f32_le()?);
            Some(DecodedPacket::Telemetry(TelemetryRecord::Realtime(RealtimeUpdate {
                event_time,
                session_type,
                session_time,
            })))
        }
        message_type::CAR_UPDATE => decode_car_update(&mut reader)
            .map(|car| DecodedPacket::Telemetry(TelemetryRecord::Car(car))),
        message_type::ENTRY_LIST => decode_entry_list(&mut reader).map(DecodedPacket::Control),
        message_type::TRACK_DATA => decode_track_data(&mut reader).map(DecodedPacket::Control),
        message_type::ENTRY_LIST_CAR => {
            let car_id = reader.read_u16_le()?;
            let model_id = reader.read_u8()?;
            let team_name = reader.read_wide_string(TEAM_NAME_CHARS);
            Some(DecodedPacket::Telemetry(TelemetryRecord::EntryListCar(EntryListCar {
                car_id,
                model_id,
                team_name,
            })))
        }
        _ => heuristic::scan_speed(data)
            .map(|sample| DecodedPacket::Telemetry(TelemetryRecord::Generic(sample))),
    }
}

fn decode_car_update(reader: &mut WireReader<'_>) -> Option<CarUpdate> {
    let car_id = reader.read_u16_le()?;
    let speed = reader.read_f32_le()?;
    let rpm = reader.read_f32_le()?;
    let gear = reader.read_u8()?;
    let x = reader.read_f32_le()?;
    let y = reader.read_f32_le()?;
    let z = reader.read_f32_le()?;

    let speed_kmh = plausible_speed(speed).then_some(speed);
    let rpm = (rpm.is_finite() && (0.0..=MAX_PLAUSIBLE_RPM).contains(&rpm)).then_some(rpm);
    if speed_kmh.is_none() && rpm.is_none() {
        return None;
    }

    let finite = crate::sanitize::finite_f32;
    Some(CarUpdate { car_id, speed_kmh, rpm, gear, world_position: [finite(x), finite(y), finite(z)] })
}

fn decode_entry_list(reader: &mut WireReader<'_>) -> Option<ControlMessage> {
    let connection_id = reader.read_u32_le()?;
    let count = usize::from(reader.read_u16_le()?);
    let car_ids = std::iter::from_fn(|| reader.read_u16_le()).take(count).collect();
    Some(ControlMessage::EntryList { connection_id, car_ids })
}

fn decode_track_data(reader: &mut WireReader<'_>) -> Option<ControlMessage> {
    let connection_id = reader.read_u32_le()?;
    let name = reader.read_prefixed_string()?;
    let track_id = reader.read_i32_le()?;
    let length_m = reader.read_i32_le()?;
    Some(ControlMessage::TrackData { connection_id, name, track_id, length_m })
}
