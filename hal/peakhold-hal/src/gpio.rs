//! Pin mode abstraction
//!
//! The sampling core only ever needs to hand its acquisition pin to the
//! ADC and give it back afterwards.

/// Mode of an acquisition pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Plain digital input (power-on default)
    Input,
    /// Analog input routed to the ADC
    Analog,
}

/// Pin mode control
///
/// Called once when a channel starts and once when it is torn down.
pub trait PinControl {
    /// Configure `pin` for `mode`
    fn set_mode(&mut self, pin: u16, mode: PinMode);
}

impl<T: PinControl + ?Sized> PinControl for &mut T {
    fn set_mode(&mut self, pin: u16, mode: PinMode) {
        (**self).set_mode(pin, mode)
    }
}
