//! Fallback for datagrams whose type byte is not recognized.
//!
//! The scan interprets a handful of aligned offsets as little-endian `f32`
//! and takes the first plausible speed. It guesses. Everything it produces
//! is tagged [`Confidence::Heuristic`](crate::types::Confidence::Heuristic)
//! and loses to any decoded or structured value during the merge.

use super::wire::f32_at;

/// Offsets probed, in order.
pub const CANDIDATE_OFFSETS: [usize; 8] = [4, 8, 12, 16, 20, 24, 28, 32];

/// Upper bound of a plausible speed in km/h.
pub const MAX_PLAUSIBLE_SPEED_KMH: f32 = 400.0;

/// Speed guessed from an unrecognized datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenericSample {
    pub speed_kmh: f32,
    /// Offset the speed was read from
    pub offset: usize,
}

pub(crate) fn plausible_speed(value: f32) -> bool {
    value.is_finite() && (0.0..=MAX_PLAUSIBLE_SPEED_KMH).contains(&value)
}

/// Scan the candidate offsets. A standing car (`0.0`) is not accepted
/// because zero-filled padding would match everywhere.
pub fn scan_speed(data: &[u8]) -> Option<GenericSample> {
    CANDIDATE_OFFSETS.iter().find_map(|&offset| {
        let value = f32_at(data, offset)?;
        (value > 0.0 && plausible_speed(value)).then_some(GenericSample { speed_kmh: value, offset })
    })
}
