//! Configuration records
//!
//! Every record persisted to non-volatile storage has a fixed size and an
//! explicit little-endian field order. Checksums are computed over that
//! encoding, so they do not depend on struct padding or target.

pub mod calibration;
pub mod codec;
pub mod dynamics;
pub mod records;
pub mod types;

pub use calibration::*;
pub use codec::{ByteReader, ByteWriter, Record, RecordError, MAX_RECORD_SIZE};
pub use dynamics::*;
pub use records::*;
pub use types::*;

/// Rejected configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Slope is zero, negative or not finite
    InvalidSlope,
    /// Zero offset is negative or not finite
    NegativeOffset,
    /// Decay rate is zero, negative or not finite
    InvalidDecayRate,
    /// Linear decay rate of 1 or more would hold or grow the peak
    DecayRateNotDecaying,
}
