//! Slow data records, one carried by each frame of the ten-frame cycle.

use tartan_bitfield::bitfield;
use zerocopy::TryFromBytes;

use super::{
    field::{Concentration, Revision, decode_percent, decode_u8},
    frame::{FrameId, PAYLOAD_LEN},
};

/// A slow data record, selected by the frame identifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlowData {
    Inspiration(GasValues),
    Expiration(GasValues),
    Momentary(GasValues),
    General(GeneralValues),
    SensorRegisters(SensorRegisters),
    Configuration(ConfigurationData),
    Service(ServiceData),
}

impl SlowData {
    /// Decode the slow data payload of a frame.
    ///
    /// Returns `None` for reserved identifiers.
    pub fn decode(id: FrameId, r: [u8; PAYLOAD_LEN], revision: Revision) -> Option<Self> {
        let record = match id {
            FrameId::Inspiration => Self::Inspiration(GasValues::decode(r, revision)),
            FrameId::Expiration => Self::Expiration(GasValues::decode(r, revision)),
            FrameId::Momentary => Self::Momentary(GasValues::decode(r, revision)),
            FrameId::General => Self::General(GeneralValues::decode(r, revision)),
            FrameId::SensorRegisters => Self::SensorRegisters(SensorRegisters::decode(r)),
            FrameId::Configuration => Self::Configuration(ConfigurationData::decode(r, revision)),
            FrameId::Service => Self::Service(ServiceData::decode(r, revision)),
            FrameId::Reserved7 | FrameId::Reserved8 | FrameId::Reserved9 => return None,
        };

        Some(record)
    }

    /// The frame identifier that carries this record.
    pub fn frame_id(&self) -> FrameId {
        match self {
            Self::Inspiration(_) => FrameId::Inspiration,
            Self::Expiration(_) => FrameId::Expiration,
            Self::Momentary(_) => FrameId::Momentary,
            Self::General(_) => FrameId::General,
            Self::SensorRegisters(_) => FrameId::SensorRegisters,
            Self::Configuration(_) => FrameId::Configuration,
            Self::Service(_) => FrameId::Service,
        }
    }
}

/// Per-gas concentrations, used for inspired, expired, and momentary values.
///
/// Bytes `0..5` hold CO2, N2O, agent 1, agent 2, and O2; byte 5 is reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasValues {
    pub co2: Concentration,
    pub n2o: Concentration,
    pub agent1: Concentration,
    pub agent2: Concentration,
    pub o2: Concentration,
}

impl GasValues {
    fn decode([co2, n2o, agent1, agent2, o2, _]: [u8; PAYLOAD_LEN], revision: Revision) -> Self {
        Self {
            co2: decode_percent(co2, revision),
            n2o: decode_percent(n2o, revision),
            agent1: decode_percent(agent1, revision),
            agent2: decode_percent(agent2, revision),
            o2: decode_percent(o2, revision),
        }
    }
}

/// Anesthetic agent identification.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromBytes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Agent {
    NoAgent = 0,
    Halothane = 1,
    Enflurane = 2,
    Isoflurane = 3,
    Sevoflurane = 4,
    Desflurane = 5,
}

impl Agent {
    fn decode(raw: u8) -> Option<Self> {
        zerocopy::try_transmute!(raw).ok()
    }
}

/// Breathing and ambient values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneralValues {
    /// Breaths per minute.
    pub respiration_rate: Option<u8>,
    /// Seconds since the last detected breath.
    pub time_since_breath: Option<u8>,
    pub primary_agent: Option<Agent>,
    pub secondary_agent: Option<Agent>,
    /// Kilopascals.
    pub atmospheric_pressure: Option<f32>,
}

impl GeneralValues {
    fn decode(r: [u8; PAYLOAD_LEN], revision: Revision) -> Self {
        Self {
            respiration_rate: decode_u8(r[0]),
            time_since_breath: decode_u8(r[1]),
            primary_agent: Agent::decode(r[2]),
            secondary_agent: Agent::decode(r[3]),
            atmospheric_pressure: revision.decode_pressure([r[4], r[5]]),
        }
    }
}

/// Operating mode of the sensor.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromBytes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    SelfTest = 0,
    Sleep = 1,
    Measurement = 2,
    Demo = 3,
}

/// Sensor error register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRegister {
    pub software: bool,
    pub hardware: bool,
    /// Motor speed out of bounds.
    pub motor_speed: bool,
    /// Factory calibration lost.
    pub calibration_lost: bool,
}

/// Airway adapter register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdapterRegister {
    /// Infrared signal low.
    pub replace_adapter: bool,
    /// Infrared signal high.
    pub no_adapter: bool,
    pub o2_port_clogged: bool,
}

/// Data validity register. Each flag marks a reading outside its specified
/// range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataValidRegister {
    pub co2_out_of_range: bool,
    pub n2o_out_of_range: bool,
    pub agent_out_of_range: bool,
    pub o2_out_of_range: bool,
    pub temperature_out_of_range: bool,
    pub pressure_out_of_range: bool,
    /// Negative concentrations were measured.
    pub zero_calibration_required: bool,
}

/// Sensor mode and register snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorRegisters {
    pub mode: Option<Mode>,
    pub error: ErrorRegister,
    pub adapter: AdapterRegister,
    pub data_valid: DataValidRegister,
}

impl SensorRegisters {
    fn decode(r: [u8; PAYLOAD_LEN]) -> Self {
        bitfield! {
            struct ErrorByte(u8) {
                [0] software,
                [1] hardware,
                [2] motor_speed,
                [3] calibration_lost,
            }
        }

        bitfield! {
            struct AdapterByte(u8) {
                [0] replace_adapter,
                [1] no_adapter,
                [2] o2_port_clogged,
            }
        }

        bitfield! {
            struct DataValidByte(u8) {
                [0] co2_out_of_range,
                [1] n2o_out_of_range,
                [2] agent_out_of_range,
                [3] o2_out_of_range,
                [4] temperature_out_of_range,
                [5] pressure_out_of_range,
                [6] zero_calibration_required,
            }
        }

        let error = ErrorByte(r[1]);
        let adapter = AdapterByte(r[2]);
        let data_valid = DataValidByte(r[3]);

        Self {
            mode: zerocopy::try_transmute!(r[0]).ok(),
            error: ErrorRegister {
                software: error.software(),
                hardware: error.hardware(),
                motor_speed: error.motor_speed(),
                calibration_lost: error.calibration_lost(),
            },
            adapter: AdapterRegister {
                replace_adapter: adapter.replace_adapter(),
                no_adapter: adapter.no_adapter(),
                o2_port_clogged: adapter.o2_port_clogged(),
            },
            data_valid: DataValidRegister {
                co2_out_of_range: data_valid.co2_out_of_range(),
                n2o_out_of_range: data_valid.n2o_out_of_range(),
                agent_out_of_range: data_valid.agent_out_of_range(),
                o2_out_of_range: data_valid.o2_out_of_range(),
                temperature_out_of_range: data_valid.temperature_out_of_range(),
                pressure_out_of_range: data_valid.pressure_out_of_range(),
                zero_calibration_required: data_valid.zero_calibration_required(),
            },
        }
    }
}

/// Gas measurement options fitted to the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FittedOptions {
    pub o2: bool,
    pub co2: bool,
    pub n2o: bool,
    pub halothane: bool,
    pub enflurane: bool,
    pub isoflurane: bool,
    pub sevoflurane: bool,
    pub desflurane: bool,
}

/// Sensor configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigurationData {
    pub fitted: FittedOptions,
    pub hardware_revision: Option<u16>,
    pub software_revision: Option<u16>,
    /// Automatic agent identification is enabled.
    pub auto_identification: bool,
    /// Communication protocol revision reported by the sensor.
    pub protocol_revision: Option<u8>,
}

impl ConfigurationData {
    fn decode(r: [u8; PAYLOAD_LEN], revision: Revision) -> Self {
        bitfield! {
            struct FittedByte(u8) {
                [0] o2,
                [1] co2,
                [2] n2o,
                [3] halothane,
                [4] enflurane,
                [5] isoflurane,
                [6] sevoflurane,
                [7] desflurane,
            }
        }

        let fitted = FittedByte(r[0]);

        // Byte 1 is reserved in the legacy layout.
        let (auto_identification, protocol_revision) = match revision {
            Revision::Current => {
                bitfield! {
                    struct IdentificationByte(u8) {
                        [0..7] protocol_revision: u8,
                        [7] auto_identification,
                    }
                }

                let id = IdentificationByte(r[1]);
                (id.auto_identification(), Some(id.protocol_revision()))
            }
            Revision::Legacy => (false, None),
        };

        Self {
            fitted: FittedOptions {
                o2: fitted.o2(),
                co2: fitted.co2(),
                n2o: fitted.n2o(),
                halothane: fitted.halothane(),
                enflurane: fitted.enflurane(),
                isoflurane: fitted.isoflurane(),
                sevoflurane: fitted.sevoflurane(),
                desflurane: fitted.desflurane(),
            },
            hardware_revision: revision.decode_number([r[2], r[3]]),
            software_revision: revision.decode_number([r[4], r[5]]),
            auto_identification,
            protocol_revision,
        }
    }
}

/// Calibration service status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceStatus {
    pub zero_disabled: bool,
    pub zero_in_progress: bool,
    /// O2 span calibration failed.
    pub span_calibration_error: bool,
    pub span_calibration_in_progress: bool,
}

/// Service information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceData {
    pub serial_number: Option<u16>,
    pub status: ServiceStatus,
}

impl ServiceData {
    fn decode(r: [u8; PAYLOAD_LEN], revision: Revision) -> Self {
        bitfield! {
            struct ServiceByte(u8) {
                [0] zero_disabled,
                [1] zero_in_progress,
                [2] span_calibration_error,
                [3] span_calibration_in_progress,
            }
        }

        let status = ServiceByte(r[2]);

        Self {
            serial_number: revision.decode_number([r[0], r[1]]),
            status: ServiceStatus {
                zero_disabled: status.zero_disabled(),
                zero_in_progress: status.zero_in_progress(),
                span_calibration_error: status.span_calibration_error(),
                span_calibration_in_progress: status.span_calibration_in_progress(),
            },
        }
    }
}
