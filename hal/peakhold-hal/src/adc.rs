//! Analog input abstraction

/// Errors from an ADC conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// No ADC channel is bound to the requested pin
    UnknownChannel,
    /// The converter reported a failure
    Conversion,
}

/// Source of raw ADC readings
///
/// Implementations return a count in `[0, adc_max]` for the configured
/// resolution. A read may block for the conversion time but no longer.
pub trait AnalogInput {
    /// Read one raw sample from the given channel (pin number)
    fn read_raw(&mut self, channel: u16) -> Result<u16, AdcError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_raw(&mut self, channel: u16) -> Result<u16, AdcError> {
        (**self).read_raw(channel)
    }
}
