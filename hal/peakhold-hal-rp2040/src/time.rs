//! Clock backed by the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use peakhold_hal::Clock;

/// Milliseconds since boot, truncated to 32 bits like a hardware counter
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }

    fn delay_us(&self, us: u32) {
        block_for(Duration::from_micros(us as u64));
    }
}
