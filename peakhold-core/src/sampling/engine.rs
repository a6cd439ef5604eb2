//! Time-gated ADC sampling with averaging and calibration

use peakhold_hal::{AnalogInput, Clock};

use super::{timer_due, SampleError};
use crate::config::{CalibrationData, DynamicParams};

/// Convert a raw reading to calibrated millivolts
///
/// Scales by supply voltage over converter max count, multiplies by the
/// slope, then subtracts the zero offset. Results below the offset read
/// as zero.
pub fn map_raw(raw: u16, calibration: &CalibrationData, dynamics: &DynamicParams) -> f64 {
    let supply = dynamics.supply_voltage.millivolts() as f64;
    let full_scale = dynamics.adc_resolution.max_count() as f64;
    let mapped = raw as f64 * supply / full_scale * calibration.slope as f64;

    let offset = calibration.zero_offset_mv as f64;
    if mapped >= offset {
        mapped - offset
    } else {
        0.0
    }
}

/// Polls one ADC channel at a fixed interval
pub struct SamplingEngine<A, C> {
    adc: A,
    clock: C,
    raw_value: u16,
    mapped_value: f64,
    last_poll_ms: u32,
}

impl<A: AnalogInput, C: Clock> SamplingEngine<A, C> {
    /// Create an engine; the poll timer starts at time 0
    pub fn new(adc: A, clock: C) -> Self {
        Self {
            adc,
            clock,
            raw_value: 0,
            mapped_value: 0.0,
            last_poll_ms: 0,
        }
    }

    /// Current time from the engine's clock
    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Last raw reading
    pub fn raw_value(&self) -> u16 {
        self.raw_value
    }

    /// Last calibrated value (mV)
    pub fn mapped_value(&self) -> f64 {
        self.mapped_value
    }

    /// Time of the last poll fire (ms)
    pub fn last_poll_ms(&self) -> u32 {
        self.last_poll_ms
    }

    /// Sample if the poll interval has elapsed at `now_ms`
    ///
    /// Returns `Ok(true)` when a new value was taken. A failed conversion
    /// still consumes the tick and leaves the previous values in place.
    pub fn poll(
        &mut self,
        now_ms: u32,
        calibration: &CalibrationData,
        dynamics: &DynamicParams,
    ) -> Result<bool, SampleError> {
        if !timer_due(now_ms, self.last_poll_ms, dynamics.poll_interval_ms) {
            return Ok(false);
        }
        self.last_poll_ms = now_ms;

        let raw = self.read_averaged(calibration)?;
        self.raw_value = raw;
        self.mapped_value = map_raw(raw, calibration, dynamics);
        Ok(true)
    }

    /// Read the channel, averaging `sample_count` conversions
    ///
    /// Waits `sample_period_us` between consecutive conversions. The mean
    /// is truncated towards zero.
    pub fn read_averaged(&mut self, calibration: &CalibrationData) -> Result<u16, SampleError> {
        let channel = calibration.channel_id;
        let count = calibration.conversions_per_poll();

        let mut sum: u32 = 0;
        for i in 0..count {
            if i > 0 {
                self.clock.delay_us(calibration.sample_period_us as u32);
            }
            sum += self.adc.read_raw(channel)? as u32;
        }
        Ok((sum / count as u32) as u16)
    }

    /// Shared access to the ADC
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Shared access to the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Give back the ADC and clock
    pub fn into_parts(self) -> (A, C) {
        (self.adc, self.clock)
    }
}
