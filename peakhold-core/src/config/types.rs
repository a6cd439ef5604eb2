//! Enumerated configuration values

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::RecordError;

/// ADC resolution, as the maximum raw count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u16)]
pub enum AdcResolution {
    /// 10-bit converter
    Bits10 = 1023,
    /// 12-bit converter (RP2040, ESP32)
    #[default]
    Bits12 = 4095,
    /// 13-bit converter
    Bits13 = 8191,
    /// 16-bit converter
    Bits16 = 65535,
}

impl AdcResolution {
    /// Largest raw count the converter returns
    pub const fn max_count(self) -> u16 {
        self as u16
    }

    /// Look up a resolution by its max count
    pub fn from_max_count(value: u16) -> Result<Self, RecordError> {
        match value {
            1023 => Ok(Self::Bits10),
            4095 => Ok(Self::Bits12),
            8191 => Ok(Self::Bits13),
            65535 => Ok(Self::Bits16),
            _ => Err(RecordError::InvalidResolution),
        }
    }
}

/// Microcontroller supply (ADC reference) voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u16)]
pub enum SupplyVoltage {
    /// 3.3 V
    #[default]
    Mv3300 = 3300,
    /// 5 V
    Mv5000 = 5000,
}

impl SupplyVoltage {
    /// Voltage in millivolts
    pub const fn millivolts(self) -> u16 {
        self as u16
    }

    /// Look up a supply voltage by millivolts
    pub fn from_millivolts(value: u16) -> Result<Self, RecordError> {
        match value {
            3300 => Ok(Self::Mv3300),
            5000 => Ok(Self::Mv5000),
            _ => Err(RecordError::InvalidVoltage),
        }
    }
}

/// How the held peak relaxes on each hold tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u16)]
pub enum DecayModel {
    /// `peak * rate`
    #[default]
    Linear = 0,
    /// `peak * e^(-rate)`
    Exponential = 1,
}

impl DecayModel {
    /// Stored discriminant
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Look up a model by its stored discriminant
    pub fn from_u16(value: u16) -> Result<Self, RecordError> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Exponential),
            _ => Err(RecordError::InvalidDecayModel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_lookup() {
        for res in [
            AdcResolution::Bits10,
            AdcResolution::Bits12,
            AdcResolution::Bits13,
            AdcResolution::Bits16,
        ] {
            assert_eq!(AdcResolution::from_max_count(res.max_count()), Ok(res));
        }
        assert_eq!(
            AdcResolution::from_max_count(4096),
            Err(RecordError::InvalidResolution)
        );
    }

    #[test]
    fn test_voltage_lookup() {
        assert_eq!(SupplyVoltage::Mv5000.millivolts(), 5000);
        assert_eq!(SupplyVoltage::from_millivolts(3300), Ok(SupplyVoltage::Mv3300));
        assert_eq!(
            SupplyVoltage::from_millivolts(0xFFFF),
            Err(RecordError::InvalidVoltage)
        );
    }

    #[test]
    fn test_decay_model_lookup() {
        assert_eq!(DecayModel::from_u16(1), Ok(DecayModel::Exponential));
        assert_eq!(DecayModel::from_u16(2), Err(RecordError::InvalidDecayModel));
    }
}
