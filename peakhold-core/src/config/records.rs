//! Persisted records: per-channel configuration, schema version, checksums

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    ByteReader, ByteWriter, CalibrationData, ConfigError, DynamicParams, Record, RecordError,
};

/// Magic number identifying a store written by this firmware
pub const VERSION_MAGIC: u16 = 0xA5;

/// Schema version the code expects
pub const CODE_VERSION: VersionRecord = VersionRecord {
    magic_id: VERSION_MAGIC,
    major: 0,
    minor: 1,
    patch: 0,
};

/// Complete user configuration of one channel
///
/// This is the record reconciled at startup: calibration followed by
/// dynamic parameters (28 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelConfig {
    pub calibration: CalibrationData,
    pub dynamics: DynamicParams,
}

impl ChannelConfig {
    pub const fn new(calibration: CalibrationData, dynamics: DynamicParams) -> Self {
        Self {
            calibration,
            dynamics,
        }
    }

    /// Check calibration and dynamics invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calibration.validate()?;
        self.dynamics.validate()
    }
}

impl Record for ChannelConfig {
    const SIZE: usize = CalibrationData::SIZE + DynamicParams::SIZE;

    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        let mut w = ByteWriter::new(buf);
        w.put_record(&self.calibration)?;
        w.put_record(&self.dynamics)?;
        Ok(w.position())
    }

    fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        let mut r = ByteReader::new(buf);
        Ok(Self {
            calibration: r.record()?,
            dynamics: r.record()?,
        })
    }
}

/// Store identity and schema version (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VersionRecord {
    pub magic_id: u16,
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl VersionRecord {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            magic_id: VERSION_MAGIC,
            major,
            minor,
            patch,
        }
    }

    /// True for a record read back from erased storage
    pub const fn is_erased(&self) -> bool {
        self.magic_id == 0xFFFF && self.major == 0xFFFF && self.minor == 0xFFFF && self.patch == 0xFFFF
    }
}

impl Default for VersionRecord {
    fn default() -> Self {
        CODE_VERSION
    }
}

impl Record for VersionRecord {
    const SIZE: usize = 8;

    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        let mut w = ByteWriter::new(buf);
        w.put_u16(self.magic_id)?;
        w.put_u16(self.major)?;
        w.put_u16(self.minor)?;
        w.put_u16(self.patch)?;
        Ok(w.position())
    }

    fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        let mut r = ByteReader::new(buf);
        Ok(Self {
            magic_id: r.u16()?,
            major: r.u16()?,
            minor: r.u16()?,
            patch: r.u16()?,
        })
    }
}

/// Checksums guarding one channel's stored configuration (12 bytes)
///
/// `version_crc` is the checksum of the [`VersionRecord`] in effect when the
/// configuration was written, so a schema change invalidates stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChecksumRecord {
    pub version_crc: u32,
    pub data_crc: u32,
    /// Writes performed on this slot, as of the last write
    pub write_count: u32,
}

impl ChecksumRecord {
    /// Record that matches no configuration
    pub const INVALID: Self = Self {
        version_crc: 0,
        data_crc: 0,
        write_count: 0,
    };

    /// True if this record vouches for data with `data_crc` under `version_crc`
    pub const fn vouches_for(&self, version_crc: u32, data_crc: u32) -> bool {
        self.version_crc == version_crc && self.data_crc == data_crc
    }
}

impl Record for ChecksumRecord {
    const SIZE: usize = 12;

    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        let mut w = ByteWriter::new(buf);
        w.put_u32(self.version_crc)?;
        w.put_u32(self.data_crc)?;
        w.put_u32(self.write_count)?;
        Ok(w.position())
    }

    fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        let mut r = ByteReader::new(buf);
        Ok(Self {
            version_crc: r.u32()?,
            data_crc: r.u32()?,
            write_count: r.u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdcResolution, DecayModel, SupplyVoltage};
    use proptest::prelude::*;

    fn sample_config() -> ChannelConfig {
        ChannelConfig::new(
            CalibrationData::new(26)
                .with_calibration(10.0, 1.1)
                .unwrap()
                .with_averaging(4),
            DynamicParams::default(),
        )
    }

    #[test]
    fn test_sizes_fit_buffer() {
        assert_eq!(ChannelConfig::SIZE, 28);
        assert!(ChannelConfig::SIZE <= crate::config::MAX_RECORD_SIZE);
        assert!(ChecksumRecord::SIZE <= crate::config::MAX_RECORD_SIZE);
    }

    #[test]
    fn test_channel_config_roundtrip() {
        let config = sample_config();
        let mut buf = [0u8; ChannelConfig::SIZE];
        assert_eq!(config.encode(&mut buf), Ok(ChannelConfig::SIZE));
        assert_eq!(ChannelConfig::decode(&buf), Ok(config));
    }

    #[test]
    fn test_channel_config_checksum_is_layout_bound() {
        let config = sample_config();
        let mut buf = [0u8; ChannelConfig::SIZE];
        config.encode(&mut buf).unwrap();
        assert_eq!(config.checksum(), crate::crc::checksum(&buf));
    }

    #[test]
    fn test_version_roundtrip() {
        let version = VersionRecord::new(1, 2, 3);
        let mut buf = [0u8; VersionRecord::SIZE];
        version.encode(&mut buf).unwrap();
        assert_eq!(buf, [0xA5, 0, 1, 0, 2, 0, 3, 0]);
        assert_eq!(VersionRecord::decode(&buf), Ok(version));
    }

    #[test]
    fn test_version_erased() {
        let erased = VersionRecord::decode(&[0xFF; 8]).unwrap();
        assert!(erased.is_erased());
        assert!(!CODE_VERSION.is_erased());
    }

    #[test]
    fn test_checksum_record_vouches() {
        let record = ChecksumRecord {
            version_crc: 1,
            data_crc: 2,
            write_count: 5,
        };
        assert!(record.vouches_for(1, 2));
        assert!(!record.vouches_for(1, 3));
        assert!(!record.vouches_for(9, 2));
    }

    fn arb_config() -> impl Strategy<Value = ChannelConfig> {
        (
            any::<u16>(),
            any::<u16>(),
            any::<u16>(),
            0.0f32..5000.0,
            0.01f32..10.0,
            prop_oneof![
                Just(AdcResolution::Bits10),
                Just(AdcResolution::Bits12),
                Just(AdcResolution::Bits13),
                Just(AdcResolution::Bits16),
            ],
            prop_oneof![Just(SupplyVoltage::Mv3300), Just(SupplyVoltage::Mv5000)],
            any::<u16>(),
            any::<u16>(),
            0.01f32..0.99,
            any::<bool>(),
        )
            .prop_map(
                |(pin, count, period, offset, slope, res, vcc, poll, hold, rate, exp)| {
                    ChannelConfig::new(
                        CalibrationData {
                            channel_id: pin,
                            sample_count: count,
                            sample_period_us: period,
                            zero_offset_mv: offset,
                            slope,
                        },
                        DynamicParams {
                            adc_resolution: res,
                            supply_voltage: vcc,
                            poll_interval_ms: poll,
                            hold_interval_ms: hold,
                            decay_model: if exp {
                                DecayModel::Exponential
                            } else {
                                DecayModel::Linear
                            },
                            decay_rate: rate,
                        },
                    )
                },
            )
    }

    proptest! {
        #[test]
        fn prop_channel_config_roundtrip(config in arb_config()) {
            let mut buf = [0u8; ChannelConfig::SIZE];
            config.encode(&mut buf).unwrap();
            prop_assert_eq!(ChannelConfig::decode(&buf), Ok(config));
        }

        #[test]
        fn prop_checksum_record_roundtrip(v in any::<u32>(), d in any::<u32>(), n in any::<u32>()) {
            let record = ChecksumRecord { version_crc: v, data_crc: d, write_count: n };
            let mut buf = [0u8; ChecksumRecord::SIZE];
            record.encode(&mut buf).unwrap();
            prop_assert_eq!(ChecksumRecord::decode(&buf), Ok(record));
        }
    }
}
