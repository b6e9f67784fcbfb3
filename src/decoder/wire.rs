//! Little-endian cursor over a datagram.
//!
//! Every read is bounds-checked and yields `None` past the end of the
//! buffer, so a truncated datagram can never panic the decoder.

use crate::sanitize::sanitize;

pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Start reading at `offset`.
    pub(crate) fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    pub(crate) fn position(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let slice = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_exact(N)?.try_into().ok()
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    pub(crate) fn read_u16_le(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub(crate) fn read_u32_le(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub(crate) fn read_i32_le(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Raw float. Callers range-check, so non-finite values pass through.
    pub(crate) fn read_f32_le(&mut self) -> Option<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Fixed-width UTF-16LE field of `chars` code units.
    ///
    /// A field cut short by the end of the datagram decodes whatever is
    /// present. Unpaired surrogates become U+FFFD.
    pub(crate) fn read_wide_string(&mut self, chars: usize) -> String {
        let wanted = chars.saturating_mul(2).min(self.remaining());
        let bytes = self.read_exact(wanted & !1).unwrap_or_default();
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let decoded: String = char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .filter(|&c| c != '\0')
            .collect();
        decoded.trim().to_owned()
    }

    /// Length-prefixed (`u16`) UTF-8 string, sanitized.
    pub(crate) fn read_prefixed_string(&mut self) -> Option<String> {
        let len = usize::from(self.read_u16_le()?);
        let raw = self.read_exact(len)?;
        Some(sanitize(raw))
    }
}

/// Little-endian `f32` at an absolute offset.
pub(crate) fn f32_at(data: &[u8], offset: usize) -> Option<f32> {
    WireReader::at(data, offset).read_f32_le()
}
