//! Sampling and peak-hold
//!
//! Two independent millisecond timers drive a channel:
//!
//! - The hold timer decays the peak every `hold_interval_ms`
//! - The poll timer samples, maps and ratchets every `poll_interval_ms`
//!
//! Both compare `now.wrapping_sub(last) >= interval`, so they keep working
//! across the 32-bit millisecond counter wrap.

pub mod engine;
pub mod peak;

pub use engine::{map_raw, SamplingEngine};
pub use peak::{decay, PeakTracker};

use peakhold_hal::AdcError;

/// Errors while sampling a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// ADC conversion failed
    Adc(AdcError),
}

impl From<AdcError> for SampleError {
    fn from(e: AdcError) -> Self {
        SampleError::Adc(e)
    }
}

/// Snapshot of a channel's runtime state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeSample {
    /// Last (averaged) raw reading
    pub raw_value: u16,
    /// Last calibrated value (mV)
    pub mapped_value: f64,
    /// Decaying raw peak
    pub peak_raw: f64,
    /// Calibrated value captured with the peak (mV)
    pub peak_mapped: f64,
    /// Time of the last poll fire (ms)
    pub last_poll_ms: u32,
    /// Time of the last hold fire (ms)
    pub last_hold_ms: u32,
}

/// Check if a periodic timer is due
pub(crate) fn timer_due(now_ms: u32, last_ms: u32, interval_ms: u16) -> bool {
    now_ms.wrapping_sub(last_ms) >= interval_ms as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_due() {
        assert!(!timer_due(9, 0, 10));
        assert!(timer_due(10, 0, 10));
        assert!(timer_due(0, 0, 0));
    }

    #[test]
    fn test_timer_due_across_wrap() {
        let last = u32::MAX - 4;
        assert!(!timer_due(3, last, 10));
        assert!(timer_due(5, last, 10));
    }
}
