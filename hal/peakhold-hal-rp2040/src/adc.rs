//! ADC channel management
//!
//! RP2040 has a single ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor
//!
//! Every sampled channel shares the one converter, so controllers get a
//! [`SharedAdc`] handle instead of owning the peripheral.

use core::cell::RefCell;

use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use peakhold_hal::{AdcError, AnalogInput, PinControl, PinMode};

use crate::gpio::AdcPinAllocator;

/// ADC channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
}

impl AdcChannel {
    /// Get the GPIO pin for this ADC channel
    pub fn gpio(&self) -> u16 {
        match self {
            AdcChannel::Adc0 => 26,
            AdcChannel::Adc1 => 27,
            AdcChannel::Adc2 => 28,
            AdcChannel::Adc3 => 29,
        }
    }

    /// Get ADC channel from GPIO pin
    pub fn from_gpio(gpio: u16) -> Option<Self> {
        match gpio {
            26 => Some(AdcChannel::Adc0),
            27 => Some(AdcChannel::Adc1),
            28 => Some(AdcChannel::Adc2),
            29 => Some(AdcChannel::Adc3),
            _ => None,
        }
    }
}

/// Maximum number of bound ADC pins
pub const MAX_ADC_PINS: usize = 4;

/// Blocking ADC with its bound input pins
pub struct RpAnalogInput<'d> {
    adc: Adc<'d, Blocking>,
    channels: Vec<(u16, Channel<'d>), MAX_ADC_PINS>,
    pins: AdcPinAllocator,
}

impl<'d> RpAnalogInput<'d> {
    pub fn new(adc: Adc<'d, Blocking>) -> Self {
        Self {
            adc,
            channels: Vec::new(),
            pins: AdcPinAllocator::new(),
        }
    }

    /// Bind an ADC input pin created with `Channel::new_pin`
    pub fn bind(&mut self, gpio: u16, channel: Channel<'d>) -> Result<(), AdcError> {
        if AdcChannel::from_gpio(gpio).is_none() {
            return Err(AdcError::UnknownChannel);
        }
        self.channels
            .push((gpio, channel))
            .map_err(|_| AdcError::UnknownChannel)
    }

    fn set_mode(&mut self, pin: u16, mode: PinMode) {
        match mode {
            PinMode::Analog => {
                if self.pins.allocate(pin).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("ADC pin {} unavailable", pin);
                }
            }
            PinMode::Input => self.pins.release(pin),
        }
    }

    fn read(&mut self, pin: u16) -> Result<u16, AdcError> {
        if !self.pins.is_allocated(pin) {
            return Err(AdcError::UnknownChannel);
        }
        let (_, channel) = self
            .channels
            .iter_mut()
            .find(|(gpio, _)| *gpio == pin)
            .ok_or(AdcError::UnknownChannel)?;
        self.adc
            .blocking_read(channel)
            .map_err(|_| AdcError::Conversion)
    }
}

/// ADC shared between channels in one execution context
pub type AdcMutex<'d> = Mutex<NoopRawMutex, RefCell<RpAnalogInput<'d>>>;

/// Handle to the shared ADC
///
/// Implements both [`AnalogInput`] and [`PinControl`]: reads are only
/// allowed on pins currently switched to analog mode.
#[derive(Clone, Copy)]
pub struct SharedAdc<'a, 'd> {
    inner: &'a AdcMutex<'d>,
}

impl<'a, 'd> SharedAdc<'a, 'd> {
    pub fn new(inner: &'a AdcMutex<'d>) -> Self {
        Self { inner }
    }
}

impl AnalogInput for SharedAdc<'_, '_> {
    fn read_raw(&mut self, channel: u16) -> Result<u16, AdcError> {
        self.inner.lock(|adc| adc.borrow_mut().read(channel))
    }
}

impl PinControl for SharedAdc<'_, '_> {
    fn set_mode(&mut self, pin: u16, mode: PinMode) {
        self.inner.lock(|adc| adc.borrow_mut().set_mode(pin, mode))
    }
}
