//! Field codecs and protocol revisions.
//!
//! Every codec in this module is total: each byte pattern maps either to a
//! value or to the field's 'invalid' marker, never to an error.

/// Raw single-byte value marking a missing measurement.
pub const NO_DATA: u8 = 0xFF;

/// Raw two-byte value marking a missing measurement.
pub const NO_DATA_WIDE: u16 = 0xFFFF;

/// A gas concentration in percent, or the invalid marker.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concentration(f32);

impl Concentration {
    /// Marker for a concentration the sensor did not report.
    pub const INVALID: Self = Self(-1.0);

    /// Wrap a percentage.
    pub const fn from_percent(percent: f32) -> Self {
        Self(percent)
    }

    /// The percentage, if valid.
    pub fn percent(self) -> Option<f32> {
        self.is_valid().then_some(self.0)
    }

    /// Whether this holds a measurement rather than the invalid marker.
    pub fn is_valid(self) -> bool {
        self.0 >= 0.0
    }
}

impl Default for Concentration {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A documented revision of the wire protocol.
///
/// The two revisions disagree on the scale of single-byte concentrations, on
/// where the slow data payload sits within a frame, and on how numbers in the
/// configuration and service records are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Revision {
    /// Whole-percent concentrations, payload at bytes `14..20`, packed BCD
    /// revision and serial numbers, pressure in tenths of a kilopascal.
    #[default]
    Current,
    /// Tenth-percent concentrations, payload at bytes `13..19`, binary
    /// revision and serial numbers, pressure in hundredths of a kilopascal.
    Legacy,
}

impl Revision {
    /// Offset of the six slow data bytes within a frame.
    pub const fn payload_offset(self) -> usize {
        match self {
            Self::Current => 14,
            Self::Legacy => 13,
        }
    }

    /// Divisor applied to a raw single-byte concentration.
    pub const fn percent_scale(self) -> f32 {
        match self {
            Self::Current => 1.0,
            Self::Legacy => 10.0,
        }
    }

    const fn pressure_scale(self) -> f32 {
        match self {
            Self::Current => 10.0,
            Self::Legacy => 100.0,
        }
    }

    /// Decode a two-byte revision or serial number.
    pub fn decode_number(self, r: [u8; 2]) -> Option<u16> {
        match self {
            Self::Current => decode_bcd(r),
            Self::Legacy => Some(decode_u16_be(r)),
        }
    }

    /// Decode a two-byte atmospheric pressure to kilopascals.
    pub fn decode_pressure(self, r: [u8; 2]) -> Option<f32> {
        let raw = decode_u16_be(r);
        (raw != NO_DATA_WIDE).then(|| f32::from(raw) / self.pressure_scale())
    }
}

/// Decode a single-byte concentration, scaled per the protocol revision.
pub fn decode_percent(raw: u8, revision: Revision) -> Concentration {
    if raw == NO_DATA {
        return Concentration::INVALID;
    }

    Concentration(f32::from(raw) / revision.percent_scale())
}

/// Decode a two-byte concentration, stored as hundredths of a percent.
pub fn decode_percent_wide(raw: u16) -> Concentration {
    if raw == NO_DATA_WIDE {
        return Concentration::INVALID;
    }

    Concentration(f32::from(raw) / 100.0)
}

/// Compose a big-endian `u16`.
pub fn decode_u16_be(r: [u8; 2]) -> u16 {
    u16::from_be_bytes(r)
}

/// Decode a small integer, if it is not the invalid marker.
pub fn decode_u8(raw: u8) -> Option<u8> {
    (raw != NO_DATA).then_some(raw)
}

/// Decode four packed BCD digits, most significant first.
///
/// Returns `None` if any nibble is not a decimal digit.
pub fn decode_bcd(r: [u8; 2]) -> Option<u16> {
    let raw = decode_u16_be(r);

    (0..4).rev().try_fold(0u16, |acc, i| {
        let digit = (raw >> (i * 4)) & 0xF;
        (digit <= 9).then(|| acc * 10 + digit)
    })
}
