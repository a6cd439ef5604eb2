//! Peak-hold with periodic decay

use super::timer_due;
use crate::config::{DecayModel, DynamicParams};

/// Apply one decay step to `peak`
///
/// - `Linear`: `peak * rate`
/// - `Exponential`: `peak * e^-rate`
pub fn decay(peak: f64, model: DecayModel, rate: f32) -> f64 {
    match model {
        DecayModel::Linear => peak * rate as f64,
        DecayModel::Exponential => peak * libm::exp(-(rate as f64)),
    }
}

/// Tracks the highest recent reading and lets it decay over time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakTracker {
    peak_raw: f64,
    peak_mapped: f64,
    last_hold_ms: u32,
}

impl PeakTracker {
    /// Create a tracker with a zero peak; the hold timer starts at time 0
    pub const fn new() -> Self {
        Self {
            peak_raw: 0.0,
            peak_mapped: 0.0,
            last_hold_ms: 0,
        }
    }

    /// Decaying raw peak
    pub fn peak_raw(&self) -> f64 {
        self.peak_raw
    }

    /// Calibrated value captured with the peak (mV)
    pub fn peak_mapped(&self) -> f64 {
        self.peak_mapped
    }

    /// Time of the last decay step (ms)
    pub fn last_hold_ms(&self) -> u32 {
        self.last_hold_ms
    }

    /// Decay the raw peak if the hold interval has elapsed
    ///
    /// Only the raw peak decays; the mapped peak keeps the value captured
    /// with the last new maximum.
    pub fn tick(&mut self, now_ms: u32, dynamics: &DynamicParams) -> bool {
        if !timer_due(now_ms, self.last_hold_ms, dynamics.hold_interval_ms) {
            return false;
        }
        self.peak_raw = decay(self.peak_raw, dynamics.decay_model, dynamics.decay_rate);
        self.last_hold_ms = now_ms;
        true
    }

    /// Take a new reading as the peak if it reaches the current one
    pub fn observe(&mut self, raw: u16, mapped: f64) -> bool {
        let raw = raw as f64;
        if raw < self.peak_raw {
            return false;
        }
        self.peak_raw = raw;
        self.peak_mapped = mapped;
        true
    }

    #[cfg(test)]
    pub(crate) fn with_peak(peak_raw: f64, peak_mapped: f64) -> Self {
        Self {
            peak_raw,
            peak_mapped,
            last_hold_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dynamics(model: DecayModel, rate: f32) -> DynamicParams {
        DynamicParams {
            decay_model: model,
            decay_rate: rate,
            hold_interval_ms: 100,
            ..DynamicParams::default()
        }
    }

    #[test]
    fn test_linear_decay() {
        let mut tracker = PeakTracker::with_peak(1000.0, 800.0);
        assert!(tracker.tick(100, &dynamics(DecayModel::Linear, 0.9)));
        assert!((tracker.peak_raw() - 900.0).abs() < 1e-3);
        assert_eq!(tracker.peak_mapped(), 800.0);
    }

    #[test]
    fn test_exponential_decay() {
        let mut tracker = PeakTracker::with_peak(1000.0, 0.0);
        assert!(tracker.tick(100, &dynamics(DecayModel::Exponential, 0.1)));
        assert!((tracker.peak_raw() - 904.837).abs() < 1e-2);
    }

    #[test]
    fn test_hold_interval_gates_decay() {
        let params = dynamics(DecayModel::Linear, 0.5);
        let mut tracker = PeakTracker::with_peak(1000.0, 0.0);

        assert!(!tracker.tick(99, &params));
        assert_eq!(tracker.peak_raw(), 1000.0);

        assert!(tracker.tick(100, &params));
        assert!(!tracker.tick(150, &params));
        assert!(tracker.tick(200, &params));
        assert_eq!(tracker.peak_raw(), 250.0);
        assert_eq!(tracker.last_hold_ms(), 200);
    }

    #[test]
    fn test_ratchet_moves_raw_and_mapped_together() {
        let mut tracker = PeakTracker::new();
        assert!(tracker.observe(100, 80.6));
        assert!(!tracker.observe(99, 79.8));
        assert_eq!(tracker.peak_raw(), 100.0);
        assert_eq!(tracker.peak_mapped(), 80.6);

        // Equal readings refresh the mapped peak
        assert!(tracker.observe(100, 81.0));
        assert_eq!(tracker.peak_mapped(), 81.0);
    }

    #[test]
    fn test_decayed_peak_is_overtaken() {
        let mut tracker = PeakTracker::with_peak(1000.0, 805.9);
        tracker.tick(100, &dynamics(DecayModel::Linear, 0.9));
        assert!(tracker.observe(950, 765.6));
        assert_eq!(tracker.peak_raw(), 950.0);
    }

    proptest! {
        #[test]
        fn prop_linear_decay_never_increases(peak in 0.0f64..70000.0, rate in 0.001f32..0.999) {
            let decayed = decay(peak, DecayModel::Linear, rate);
            prop_assert!(decayed <= peak);
            prop_assert!(decayed >= 0.0);
        }

        #[test]
        fn prop_exponential_decay_never_increases(peak in 0.0f64..70000.0, rate in 0.001f32..20.0) {
            let decayed = decay(peak, DecayModel::Exponential, rate);
            prop_assert!(decayed <= peak);
            prop_assert!(decayed >= 0.0);
        }

        #[test]
        fn prop_peak_at_least_last_reading(readings in proptest::collection::vec(any::<u16>(), 1..32)) {
            let mut tracker = PeakTracker::new();
            for &raw in &readings {
                tracker.observe(raw, raw as f64);
                prop_assert!(tracker.peak_raw() >= raw as f64);
            }
        }
    }
}
