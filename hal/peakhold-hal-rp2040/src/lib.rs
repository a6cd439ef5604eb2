//! RP2040 implementations of the peakhold HAL traits
//!
//! - ADC channel allocation and blocking conversions
//! - Flash-emulated EEPROM in the last flash sector
//! - Millisecond clock on top of `embassy-time`

#![no_std]

pub mod adc;
pub mod eeprom;
pub mod gpio;
pub mod time;

pub use adc::{AdcChannel, RpAnalogInput, SharedAdc};
pub use eeprom::FlashEeprom;
pub use gpio::AdcPinAllocator;
pub use time::EmbassyClock;
