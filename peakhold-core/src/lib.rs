//! Board-agnostic core logic for the peakhold sampling firmware
//!
//! This crate contains everything that does not depend on a specific
//! board:
//!
//! - CRC32 over canonical record encodings
//! - Configuration records and their fixed byte layout
//! - The configuration registry deciding when storage must be written
//! - Time-gated sampling with averaging and calibration
//! - Peak tracking with linear or exponential decay
//! - The per-channel controller tying it all together
//!
//! Hardware is reached only through the `peakhold-hal` traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod channel;
pub mod config;
pub mod crc;
pub mod registry;
pub mod sampling;

pub use channel::{ChannelController, ChannelError};
pub use config::{
    AdcResolution, CalibrationData, ChannelConfig, ChecksumRecord, ConfigError, DecayModel,
    DynamicParams, SupplyVoltage, VersionRecord,
};
pub use registry::{ConfigRegistry, InstanceId, Reconciled, RegistryError};
