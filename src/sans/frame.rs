//! Validation and decoding of a single bounded frame.

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{FromBytes, TryFromBytes};

use super::{
    check::compute_checksum,
    field::{Concentration, Revision, decode_percent_wide, decode_u16_be},
    slow::SlowData,
};

/// Length of every frame, in bytes.
pub const FRAME_LEN: usize = 21;

/// Marker opening every frame.
pub const SYNC: [u8; 2] = [0xAA, 0x55];

/// Length of the slow data payload, in bytes.
pub const PAYLOAD_LEN: usize = 6;

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawFrame {
    sync: [u8; 2],
    id: u8,
    status: u8,
    waveform: [[u8; 2]; 5],
    _payload: [u8; PAYLOAD_LEN],
    _checksum: u8,
}

/// An error decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame does not open with the sync marker.
    #[error("Incorrect sync marker ({found:02X?}).")]
    InvalidSync { found: [u8; 2] },
    /// Calculated and found checksums do not match.
    #[error("Calculated ({calculated:#04x}) and found ({found:#04x}) checksums do not match.")]
    ChecksumMismatch { found: u8, calculated: u8 },
    /// The frame identifier is outside the slow data cycle.
    #[error("Unknown frame identifier ({0}).")]
    InvalidFrameId(u8),
}

/// Position of a frame within the ten-frame slow data cycle.
///
/// Selects which slow data record the frame carries.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromBytes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameId {
    Inspiration = 0,
    Expiration = 1,
    Momentary = 2,
    General = 3,
    SensorRegisters = 4,
    Configuration = 5,
    Service = 6,
    Reserved7 = 7,
    Reserved8 = 8,
    Reserved9 = 9,
}

impl FrameId {
    /// The raw identifier, as sent on the wire.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Whether this identifier carries no slow data.
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::Reserved7 | Self::Reserved8 | Self::Reserved9)
    }
}

impl TryFrom<u8> for FrameId {
    type Error = FrameError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        zerocopy::try_transmute!(raw).map_err(|_| FrameError::InvalidFrameId(raw))
    }
}

/// Gas concentrations sampled every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waveform {
    pub co2: Concentration,
    pub n2o: Concentration,
    pub agent1: Concentration,
    pub agent2: Concentration,
    pub o2: Concentration,
}

impl Waveform {
    fn from_words([co2, n2o, agent1, agent2, o2]: [[u8; 2]; 5]) -> Self {
        let decode = |w| decode_percent_wide(decode_u16_be(w));

        Self {
            co2: decode(co2),
            n2o: decode(n2o),
            agent1: decode(agent1),
            agent2: decode(agent2),
            o2: decode(o2),
        }
    }
}

/// Summary flags sent every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    pub breath_detected: bool,
    pub apnea: bool,
    /// O2 sensor sensitivity is low.
    pub o2_low: bool,
    pub o2_replace: bool,
    pub check_adapter: bool,
    pub accuracy_out_of_range: bool,
    pub sensor_error: bool,
    pub o2_calibration_required: bool,
}

impl Status {
    fn from_byte(r: u8) -> Self {
        bitfield! {
            struct StatusByte(u8) {
                [0] breath_detected,
                [1] apnea,
                [2] o2_low,
                [3] o2_replace,
                [4] check_adapter,
                [5] accuracy_out_of_range,
                [6] sensor_error,
                [7] o2_calibration_required,
            }
        }

        let s = StatusByte(r);

        Self {
            breath_detected: s.breath_detected(),
            apnea: s.apnea(),
            o2_low: s.o2_low(),
            o2_replace: s.o2_replace(),
            check_adapter: s.check_adapter(),
            accuracy_out_of_range: s.accuracy_out_of_range(),
            sensor_error: s.sensor_error(),
            o2_calibration_required: s.o2_calibration_required(),
        }
    }

    /// Whether any flag other than breath detection is raised.
    pub fn has_alarm(&self) -> bool {
        self.apnea
            || self.o2_low
            || self.o2_replace
            || self.check_adapter
            || self.accuracy_out_of_range
            || self.sensor_error
            || self.o2_calibration_required
    }
}

/// The contents of a valid frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedFrame {
    pub frame_id: FrameId,
    pub waveform: Waveform,
    pub status: Status,
    /// The slow data record, absent for reserved identifiers.
    pub slow_data: Option<SlowData>,
}

/// Decode a frame.
///
/// Rejects frames with an incorrect sync marker, checksum, or identifier, in
/// that order.
pub fn decode(r: &[u8; FRAME_LEN], revision: Revision) -> Result<DecodedFrame, FrameError> {
    let raw = validate(r)?;

    let frame_id = FrameId::try_from(raw.id)?;

    let offset = revision.payload_offset();
    let mut payload = [0; PAYLOAD_LEN];
    payload.copy_from_slice(&r[offset..offset + PAYLOAD_LEN]);

    Ok(DecodedFrame {
        frame_id,
        waveform: Waveform::from_words(raw.waveform),
        status: Status::from_byte(raw.status),
        slow_data: SlowData::decode(frame_id, payload, revision),
    })
}

/// Decode only the waveform and status of a frame.
///
/// The frame identifier is not inspected, so fast data can be salvaged from
/// frames [`decode`] rejects with [`FrameError::InvalidFrameId`].
pub fn decode_fast(r: &[u8; FRAME_LEN]) -> Result<(Waveform, Status), FrameError> {
    let raw = validate(r)?;

    Ok((
        Waveform::from_words(raw.waveform),
        Status::from_byte(raw.status),
    ))
}

fn validate(r: &[u8; FRAME_LEN]) -> Result<RawFrame, FrameError> {
    let raw: RawFrame = zerocopy::transmute!(*r);

    let found = raw.sync;
    if found != SYNC {
        Err(FrameError::InvalidSync { found })?;
    }

    let calculated = compute_checksum(r);
    let found = r[FRAME_LEN - 1];
    if found != calculated {
        Err(FrameError::ChecksumMismatch { found, calculated })?;
    }

    Ok(raw)
}

/// Assemble a frame around its variable parts, computing the checksum.
///
/// Useful for tests and simulators. The payload is placed per `revision`; under
/// [`Revision::Legacy`] its first byte overwrites the low byte of the O2 word.
pub fn encode(
    id: u8,
    status: u8,
    waveform: [u16; 5],
    payload: [u8; PAYLOAD_LEN],
    revision: Revision,
) -> [u8; FRAME_LEN] {
    let mut r = [0; FRAME_LEN];
    r[..2].copy_from_slice(&SYNC);
    r[2] = id;
    r[3] = status;

    for (i, w) in waveform.iter().enumerate() {
        r[4 + 2 * i..6 + 2 * i].copy_from_slice(&w.to_be_bytes());
    }

    let offset = revision.payload_offset();
    r[offset..offset + PAYLOAD_LEN].copy_from_slice(&payload);
    r[FRAME_LEN - 1] = compute_checksum(&r);

    r
}
