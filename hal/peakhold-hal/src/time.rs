//! Time source abstraction
//!
//! Provides the millisecond tick used by the poll and hold timers and the
//! microsecond busy-wait used between averaged samples.

/// Monotonic time source
pub trait Clock {
    /// Milliseconds since start. Wraps at `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Busy-wait for `us` microseconds
    fn delay_us(&self, us: u32);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}
