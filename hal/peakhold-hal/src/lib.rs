//! Peakhold Hardware Abstraction Layer
//!
//! This crate defines the capabilities the sampling core needs from a
//! board: an ADC, pin mode control, a byte-addressable non-volatile store
//! and a millisecond clock. Chip-specific crates implement them for real
//! hardware; the `mock` feature provides in-memory fakes for host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  peakhold-core (sampling + persistence) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  peakhold-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ peakhold-hal- │       │  mock (host   │
//! │    rp2040     │       │    tests)     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`adc::AnalogInput`] - Raw ADC conversions
//! - [`gpio::PinControl`] - Acquisition pin mode
//! - [`store::NonVolatileStore`] - Scoped EEPROM-style storage
//! - [`time::Clock`] - Monotonic milliseconds and busy-wait delays

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
#[cfg(feature = "mock")]
pub mod mock;
pub mod store;
pub mod time;

// Re-export key traits at crate root for convenience
pub use adc::{AdcError, AnalogInput};
pub use gpio::{PinControl, PinMode};
pub use store::{NonVolatileStore, StoreError};
pub use time::Clock;
