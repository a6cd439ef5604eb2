//! Runtime sampling parameters

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    AdcResolution, ByteReader, ByteWriter, ConfigError, DecayModel, Record, RecordError,
    SupplyVoltage,
};

/// Converter, timing and decay parameters of a channel
///
/// Replaced only as a whole. Stored layout (14 bytes, little-endian):
///
/// | Offset | Field              | Type |
/// |--------|--------------------|------|
/// | 0      | `adc_resolution`   | u16  |
/// | 2      | `supply_voltage`   | u16  |
/// | 4      | `poll_interval_ms` | u16  |
/// | 6      | `hold_interval_ms` | u16  |
/// | 8      | `decay_model`      | u16  |
/// | 10     | `decay_rate`       | f32  |
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DynamicParams {
    /// Converter max count
    pub adc_resolution: AdcResolution,
    /// Full-scale voltage
    pub supply_voltage: SupplyVoltage,
    /// Minimum time between polls (ms)
    pub poll_interval_ms: u16,
    /// Time between peak decay steps (ms)
    pub hold_interval_ms: u16,
    /// Peak decay model
    pub decay_model: DecayModel,
    /// Decay model parameter
    pub decay_rate: f32,
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            adc_resolution: AdcResolution::Bits12,
            supply_voltage: SupplyVoltage::Mv3300,
            poll_interval_ms: 10,
            hold_interval_ms: 1000,
            decay_model: DecayModel::Linear,
            decay_rate: 0.9,
        }
    }
}

impl DynamicParams {
    /// Create validated parameters
    pub fn new(
        adc_resolution: AdcResolution,
        supply_voltage: SupplyVoltage,
        poll_interval_ms: u16,
        hold_interval_ms: u16,
        decay_model: DecayModel,
        decay_rate: f32,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            adc_resolution,
            supply_voltage,
            poll_interval_ms,
            hold_interval_ms,
            decay_model,
            decay_rate,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the decay rate invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_rate > 0.0 && self.decay_rate.is_finite()) {
            return Err(ConfigError::InvalidDecayRate);
        }
        if self.decay_model == DecayModel::Linear && self.decay_rate >= 1.0 {
            return Err(ConfigError::DecayRateNotDecaying);
        }
        Ok(())
    }
}

impl Record for DynamicParams {
    const SIZE: usize = 14;

    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        let mut w = ByteWriter::new(buf);
        w.put_u16(self.adc_resolution.max_count())?;
        w.put_u16(self.supply_voltage.millivolts())?;
        w.put_u16(self.poll_interval_ms)?;
        w.put_u16(self.hold_interval_ms)?;
        w.put_u16(self.decay_model.as_u16())?;
        w.put_f32(self.decay_rate)?;
        Ok(w.position())
    }

    fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        let mut r = ByteReader::new(buf);
        let params = Self {
            adc_resolution: AdcResolution::from_max_count(r.u16()?)?,
            supply_voltage: SupplyVoltage::from_millivolts(r.u16()?)?,
            poll_interval_ms: r.u16()?,
            hold_interval_ms: r.u16()?,
            decay_model: DecayModel::from_u16(r.u16()?)?,
            decay_rate: r.f32()?,
        };
        params.validate().map_err(|_| RecordError::InvalidField)?;
        Ok(params)
    }
}
