//! Last-known values of every slow data record.

use super::{
    frame::FrameId,
    slow::{ConfigurationData, GasValues, GeneralValues, SensorRegisters, ServiceData, SlowData},
};

/// The most recent value of each slow data record.
///
/// Each frame carries one record, so a complete refresh takes a full ten-frame
/// cycle. Records not yet received hold their invalid markers.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlowDataAggregate {
    /// Identifier of the last merged record, `None` before the first.
    pub last_frame_id: Option<FrameId>,
    pub inspiration: GasValues,
    pub expiration: GasValues,
    pub momentary: GasValues,
    pub general: GeneralValues,
    pub sensor_registers: SensorRegisters,
    pub configuration: ConfigurationData,
    pub service: ServiceData,
}

impl SlowDataAggregate {
    /// Create an aggregate with every record invalid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every record to its invalid state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the slot for a record, leaving all others untouched.
    pub fn merge(&mut self, record: SlowData) {
        self.last_frame_id = Some(record.frame_id());

        match record {
            SlowData::Inspiration(v) => self.inspiration = v,
            SlowData::Expiration(v) => self.expiration = v,
            SlowData::Momentary(v) => self.momentary = v,
            SlowData::General(v) => self.general = v,
            SlowData::SensorRegisters(v) => self.sensor_registers = v,
            SlowData::Configuration(v) => self.configuration = v,
            SlowData::Service(v) => self.service = v,
        }
    }

    /// The current value of the slot for an identifier, if it holds one.
    pub fn get(&self, id: FrameId) -> Option<SlowData> {
        let record = match id {
            FrameId::Inspiration => SlowData::Inspiration(self.inspiration),
            FrameId::Expiration => SlowData::Expiration(self.expiration),
            FrameId::Momentary => SlowData::Momentary(self.momentary),
            FrameId::General => SlowData::General(self.general),
            FrameId::SensorRegisters => SlowData::SensorRegisters(self.sensor_registers),
            FrameId::Configuration => SlowData::Configuration(self.configuration),
            FrameId::Service => SlowData::Service(self.service),
            FrameId::Reserved7 | FrameId::Reserved8 | FrameId::Reserved9 => return None,
        };

        Some(record)
    }
}
