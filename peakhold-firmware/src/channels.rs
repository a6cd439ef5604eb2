//! Channel defaults compiled from channels.toml
//!
//! `build.rs` validates the file and generates the `CHANNELS` table;
//! invalid values fail the build instead of being clamped at runtime.

use peakhold_core::{
    AdcResolution, CalibrationData, ChannelConfig, DecayModel, DynamicParams, SupplyVoltage,
};

include!(concat!(env!("OUT_DIR"), "/channels.rs"));
