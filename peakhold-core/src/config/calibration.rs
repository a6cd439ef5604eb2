//! ADC channel calibration
//!
//! Fixed per channel: which pin is sampled, how readings are averaged and
//! how the mapped voltage is corrected.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ByteReader, ByteWriter, ConfigError, Record, RecordError};

/// Default delay between averaged samples: one ADC conversion time (µs)
pub const DEFAULT_SAMPLE_PERIOD_US: u16 = 250;

/// Calibration of one ADC channel
///
/// Stored layout (14 bytes, little-endian):
///
/// | Offset | Field              | Type |
/// |--------|--------------------|------|
/// | 0      | `channel_id`       | u16  |
/// | 2      | `sample_count`     | u16  |
/// | 4      | `sample_period_us` | u16  |
/// | 6      | `zero_offset_mv`   | f32  |
/// | 10     | `slope`            | f32  |
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationData {
    /// ADC input pin
    pub channel_id: u16,
    /// Samples averaged per poll (0 = single reading, no averaging)
    pub sample_count: u16,
    /// Busy-wait between averaged samples (µs)
    pub sample_period_us: u16,
    /// Subtracted from the mapped value (mV), never below zero
    pub zero_offset_mv: f32,
    /// Multiplier applied to the mapped value
    pub slope: f32,
}

impl CalibrationData {
    /// Uncalibrated channel without averaging
    pub const fn new(channel_id: u16) -> Self {
        Self {
            channel_id,
            sample_count: 0,
            sample_period_us: DEFAULT_SAMPLE_PERIOD_US,
            zero_offset_mv: 0.0,
            slope: 1.0,
        }
    }

    /// Set offset and slope, rejecting invalid values
    pub fn with_calibration(mut self, zero_offset_mv: f32, slope: f32) -> Result<Self, ConfigError> {
        self.zero_offset_mv = zero_offset_mv;
        self.slope = slope;
        self.validate()?;
        Ok(self)
    }

    /// Average `sample_count` readings per poll
    pub const fn with_averaging(mut self, sample_count: u16) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Override the delay between averaged samples
    pub const fn with_sample_period(mut self, sample_period_us: u16) -> Self {
        self.sample_period_us = sample_period_us;
        self
    }

    /// Check slope and offset invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails both comparisons
        if !(self.slope > 0.0 && self.slope.is_finite()) {
            return Err(ConfigError::InvalidSlope);
        }
        if !(self.zero_offset_mv >= 0.0 && self.zero_offset_mv.is_finite()) {
            return Err(ConfigError::NegativeOffset);
        }
        Ok(())
    }

    /// Number of ADC conversions per poll
    pub const fn conversions_per_poll(&self) -> u16 {
        if self.sample_count == 0 {
            1
        } else {
            self.sample_count
        }
    }
}

impl Record for CalibrationData {
    const SIZE: usize = 14;

    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        let mut w = ByteWriter::new(buf);
        w.put_u16(self.channel_id)?;
        w.put_u16(self.sample_count)?;
        w.put_u16(self.sample_period_us)?;
        w.put_f32(self.zero_offset_mv)?;
        w.put_f32(self.slope)?;
        Ok(w.position())
    }

    fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        let mut r = ByteReader::new(buf);
        let data = Self {
            channel_id: r.u16()?,
            sample_count: r.u16()?,
            sample_period_us: r.u16()?,
            zero_offset_mv: r.f32()?,
            slope: r.f32()?,
        };
        data.validate().map_err(|_| RecordError::InvalidField)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cal = CalibrationData::new(26);
        assert_eq!(cal.channel_id, 26);
        assert_eq!(cal.sample_count, 0);
        assert_eq!(cal.sample_period_us, DEFAULT_SAMPLE_PERIOD_US);
        assert_eq!(cal.zero_offset_mv, 0.0);
        assert_eq!(cal.slope, 1.0);
        assert!(cal.validate().is_ok());
        assert_eq!(cal.conversions_per_poll(), 1);
    }

    #[test]
    fn test_rejects_invalid_slope() {
        for slope in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                CalibrationData::new(26).with_calibration(0.0, slope),
                Err(ConfigError::InvalidSlope)
            );
        }
    }

    #[test]
    fn test_rejects_negative_offset() {
        assert_eq!(
            CalibrationData::new(26).with_calibration(-0.5, 1.0),
            Err(ConfigError::NegativeOffset)
        );
        assert_eq!(
            CalibrationData::new(26).with_calibration(f32::NAN, 1.0),
            Err(ConfigError::NegativeOffset)
        );
    }

    #[test]
    fn test_record_roundtrip() {
        let cal = CalibrationData::new(27)
            .with_calibration(12.5, 1.02)
            .unwrap()
            .with_averaging(8)
            .with_sample_period(100);

        let mut buf = [0u8; CalibrationData::SIZE];
        assert_eq!(cal.encode(&mut buf), Ok(CalibrationData::SIZE));
        assert_eq!(&buf[..6], &[27, 0, 8, 0, 100, 0]);
        assert_eq!(CalibrationData::decode(&buf), Ok(cal));
    }

    #[test]
    fn test_decode_erased_is_invalid() {
        let buf = [0xFFu8; CalibrationData::SIZE];
        assert_eq!(CalibrationData::decode(&buf), Err(RecordError::InvalidField));
    }

    #[test]
    fn test_checksum_depends_on_every_field() {
        let base = CalibrationData::new(26);
        let variants = [
            CalibrationData::new(27),
            base.with_averaging(4),
            base.with_sample_period(200),
            base.with_calibration(1.0, 1.0).unwrap(),
            base.with_calibration(0.0, 1.5).unwrap(),
        ];
        for other in variants {
            assert_ne!(base.checksum(), other.checksum());
        }
    }
}
