//! Coercion helpers shared by the decoder and both source adapters.
//!
//! Provider records are loosely typed: fields go missing, arrays arrive as
//! scalars and strings arrive as character arrays padded with NUL bytes.
//! Everything in this module is total. Absent or malformed numbers become
//! `0.0`, never `NaN` or infinity, and malformed text becomes an empty string.

use serde_json::Value;

/// Coerce an `f32` that may be non-finite into a finite value.
#[inline]
pub fn finite_f32(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Read a numeric field as `f32`.
///
/// Booleans count as `1.0`/`0.0`. Anything else that is not a finite
/// number, including values that overflow `f32`, yields `0.0`.
pub fn number(value: Option<&Value>) -> f32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    finite_f32(raw as f32)
}

/// Read a numeric field and clamp it into `[0, 1]`.
pub fn unit_interval(value: Option<&Value>) -> f32 {
    number(value).clamp(0.0, 1.0)
}

/// Read an integral field. Fractions are truncated toward zero.
pub fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Read an integral field that must not be negative.
pub fn unsigned(value: Option<&Value>) -> u32 {
    u32::try_from(integer(value).max(0)).unwrap_or(u32::MAX)
}

/// Read an integral field, keeping `None` for absent or non-numeric input.
pub fn optional_integer(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(_)) | Some(Value::Bool(_)) => Some(integer(value)),
        _ => None,
    }
}

/// Read a flag. Any non-zero number or `true` is set.
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f.is_finite() && f != 0.0),
        _ => false,
    }
}

/// Read a fixed-length numeric array.
///
/// Non-array input yields `[0.0; N]`. Short arrays are zero-padded, long
/// arrays are truncated and every element is coerced like [`number`].
pub fn array<const N: usize>(value: Option<&Value>) -> [f32; N] {
    let mut out = [0.0; N];
    if let Some(Value::Array(items)) = value {
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = number(Some(item));
        }
    }
    out
}

/// Anything a provider may hand us where a string is expected.
pub trait TextSource {
    /// Concatenate the raw text without cleaning it.
    fn raw_text(&self) -> String;
}

impl TextSource for str {
    fn raw_text(&self) -> String {
        self.to_owned()
    }
}

impl TextSource for String {
    fn raw_text(&self) -> String {
        self.clone()
    }
}

impl TextSource for [u8] {
    fn raw_text(&self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }
}

impl TextSource for [char] {
    fn raw_text(&self) -> String {
        self.iter().collect()
    }
}

impl TextSource for Vec<char> {
    fn raw_text(&self) -> String {
        self.as_slice().raw_text()
    }
}

impl TextSource for Value {
    fn raw_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) => items.iter().map(Value::raw_text).collect(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Object(_) => String::new(),
        }
    }
}

/// Clean provider text: strip NUL, turn underscores into spaces and trim.
///
/// Idempotent: `sanitize(&sanitize(s)) == sanitize(s)`.
pub fn sanitize<T: TextSource + ?Sized>(input: &T) -> String {
    let text = input.raw_text();
    let cleaned: String =
        text.chars().filter(|c| *c != '\0').map(|c| if c == '_' { ' ' } else { c }).collect();
    cleaned.trim().to_owned()
}

/// Clean an optional record field, treating absence as the empty string.
pub fn text(value: Option<&Value>) -> String {
    value.map(sanitize).unwrap_or_default()
}

/// Render a gear index for display.
///
/// `-1` is reverse, `0` and absent are neutral and forward gears print as
/// their number. Other negative values are not valid gears and show as
/// neutral.
pub fn format_gear<G: Into<Option<i32>>>(gear: G) -> String {
    match gear.into() {
        Some(-1) => "R".to_owned(),
        Some(g) if g > 0 => g.to_string(),
        _ => "N".to_owned(),
    }
}

/// Lap time placeholder shown by the simulator when no time is set.
pub const LAP_TIME_SENTINEL: &str = "--:--.---";

/// Parse an `m:ss.mmm` lap time into milliseconds.
///
/// Returns `None` for empty input, the `--:--.---` placeholder and anything
/// that does not split into exactly two numeric parts around a colon.
pub fn parse_lap_time(input: &str) -> Option<u32> {
    let cleaned = sanitize(input);
    if cleaned.is_empty() || cleaned == LAP_TIME_SENTINEL {
        return None;
    }

    let (minutes, seconds) = cleaned.split_once(':')?;
    if seconds.contains(':') {
        return None;
    }

    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: f64 = seconds.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let millis = f64::from(minutes) * 60_000.0 + (seconds * 1000.0).round();
    (millis <= f64::from(u32::MAX)).then_some(millis as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn gear_formatting() {
        assert_eq!(format_gear(-1), "R");
        assert_eq!(format_gear(0), "N");
        assert_eq!(format_gear(5), "5");
        assert_eq!(format_gear(None), "N");
        assert_eq!(format_gear(-3), "N");
    }

    #[test]
    fn lap_time_parsing() {
        assert_eq!(parse_lap_time("1:23.456"), Some(83_456));
        assert_eq!(parse_lap_time("0:59.999"), Some(59_999));
        assert_eq!(parse_lap_time("12:00.000"), Some(720_000));
        assert_eq!(parse_lap_time("--:--.---"), None);
        assert_eq!(parse_lap_time(""), None);
        assert_eq!(parse_lap_time("83.456"), None);
        assert_eq!(parse_lap_time("1:2:3"), None);
        assert_eq!(parse_lap_time("a:23.456"), None);
        assert_eq!(parse_lap_time("1:-2.0"), None);
    }

    #[test]
    fn lap_time_tolerates_padding() {
        assert_eq!(parse_lap_time("1:23.456\0\0\0"), Some(83_456));
        assert_eq!(parse_lap_time("  2:03.100 "), Some(123_100));
    }

    #[test]
    fn sanitizer_accepts_all_text_shapes() {
        assert_eq!(sanitize("Spa_Francorchamps\0\0"), "Spa Francorchamps");
        assert_eq!(sanitize(&b"monza\0\0\0"[..]), "monza");
        assert_eq!(sanitize(&['a', 'm', 'r', '_', 'v', '8', '\0'][..]), "amr v8");
        assert_eq!(sanitize(&json!(["p", "o", "r", "s", "c", "h", "e", "\u{0}"])), "porsche");
        assert_eq!(sanitize(&json!(null)), "");
    }

    #[test]
    fn numbers_default_to_zero() {
        assert_eq!(number(None), 0.0);
        assert_eq!(number(Some(&json!("fast"))), 0.0);
        assert_eq!(number(Some(&json!(1e300))), 0.0);
        assert_eq!(number(Some(&json!(true))), 1.0);
        assert_eq!(number(Some(&json!(153.5))), 153.5);
    }

    #[test]
    fn arrays_take_their_fixed_shape() {
        assert_eq!(array::<4>(Some(&json!(7))), [0.0; 4]);
        assert_eq!(array::<4>(None), [0.0; 4]);
        assert_eq!(array::<2>(Some(&json!([1.0, 2.0, 3.0]))), [1.0, 2.0]);
        assert_eq!(array::<3>(Some(&json!([1.0, "x"]))), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn integers_truncate_and_default() {
        assert_eq!(integer(Some(&json!(3.9))), 3);
        assert_eq!(integer(Some(&json!(-1))), -1);
        assert_eq!(integer(Some(&json!("3"))), 0);
        assert_eq!(unsigned(Some(&json!(-4))), 0);
        assert_eq!(optional_integer(None), None);
        assert_eq!(optional_integer(Some(&json!(2))), Some(2));
    }

    #[test]
    fn flags_follow_truthiness() {
        assert!(flag(Some(&json!(1))));
        assert!(flag(Some(&json!(true))));
        assert!(!flag(Some(&json!(0))));
        assert!(!flag(Some(&json!("1"))));
        assert!(!flag(None));
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(input in "\\PC*") {
            let once = sanitize(input.as_str());
            prop_assert_eq!(sanitize(once.as_str()), once);
        }

        #[test]
        fn sanitize_is_idempotent_on_raw_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let once = sanitize(bytes.as_slice());
            prop_assert_eq!(sanitize(once.as_str()), once.clone());
            prop_assert!(!once.contains('\0'));
            prop_assert!(!once.contains('_'));
        }

        #[test]
        fn coerced_numbers_are_finite(raw in any::<f64>()) {
            let value = serde_json::Number::from_f64(raw).map(Value::Number).unwrap_or(Value::Null);
            prop_assert!(number(Some(&value)).is_finite());
        }

        #[test]
        fn lap_time_parser_never_panics(input in "\\PC*") {
            let _ = parse_lap_time(&input);
        }

        #[test]
        fn well_formed_lap_times_round_trip(minutes in 0u32..60, seconds in 0u32..60, millis in 0u32..1000) {
            let formatted = format!("{minutes}:{seconds:02}.{millis:03}");
            prop_assert_eq!(parse_lap_time(&formatted), Some(minutes * 60_000 + seconds * 1000 + millis));
        }
    }
}
