//! Per-channel controller
//!
//! Ties one ADC pin to its configuration slot, sampling engine and peak
//! tracker. Typical lifecycle:
//!
//! ```text
//! new() ──> begin() ──> poll() ... poll() ──> drop
//!  │          │                                 │
//!  register   reconcile version + user data     pin back to input
//!             pin to analog
//! ```

use peakhold_hal::{AnalogInput, Clock, NonVolatileStore, PinControl, PinMode};

use crate::config::{CalibrationData, ChannelConfig, ConfigError, DynamicParams};
use crate::registry::{ConfigRegistry, InstanceId, Reconciled, RegistryError};
use crate::sampling::{PeakTracker, RuntimeSample, SampleError, SamplingEngine};

/// Errors from a channel controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// Rejected calibration or dynamic parameters
    Config(ConfigError),
    /// Registration or persistence failed
    Registry(RegistryError),
    /// ADC conversion failed
    Sample(SampleError),
    /// `poll()` or `reconfigure()` before `begin()`
    NotStarted,
}

impl From<ConfigError> for ChannelError {
    fn from(e: ConfigError) -> Self {
        ChannelError::Config(e)
    }
}

impl From<RegistryError> for ChannelError {
    fn from(e: RegistryError) -> Self {
        ChannelError::Registry(e)
    }
}

impl From<SampleError> for ChannelError {
    fn from(e: SampleError) -> Self {
        ChannelError::Sample(e)
    }
}

/// One sampled ADC channel with peak-hold
pub struct ChannelController<A: AnalogInput, P: PinControl, C: Clock> {
    instance: InstanceId,
    calibration: CalibrationData,
    dynamics: DynamicParams,
    engine: SamplingEngine<A, C>,
    peak: PeakTracker,
    pins: P,
    started: bool,
}

impl<A: AnalogInput, P: PinControl, C: Clock> ChannelController<A, P, C> {
    /// Create a controller and register it with `registry`
    ///
    /// Nothing is read from or written to storage until [`begin`](Self::begin).
    pub fn new<S: NonVolatileStore>(
        calibration: CalibrationData,
        registry: &mut ConfigRegistry<S>,
        adc: A,
        pins: P,
        clock: C,
    ) -> Result<Self, ChannelError> {
        calibration.validate()?;
        let instance = registry.register_instance()?;

        Ok(Self {
            instance,
            calibration,
            dynamics: DynamicParams::default(),
            engine: SamplingEngine::new(adc, clock),
            peak: PeakTracker::new(),
            pins,
            started: false,
        })
    }

    /// Reconcile persisted configuration and start acquisition
    ///
    /// `params` are the code defaults; stored data that is still valid for
    /// this code version wins over them. The returned [`Reconciled`] tells
    /// which one is in effect.
    ///
    /// `registry` must be the one passed to [`new`](Self::new); an
    /// [`InstanceId`] only indexes slots of the registry that issued it.
    pub fn begin<S: NonVolatileStore>(
        &mut self,
        registry: &mut ConfigRegistry<S>,
        params: DynamicParams,
    ) -> Result<Reconciled, ChannelError> {
        params.validate()?;
        registry.slot_address(self.instance)?;

        registry.reconcile_version()?;
        let defaults = ChannelConfig::new(self.calibration, params);
        let reconciled = registry.reconcile_user_data(self.instance, &defaults)?;

        self.calibration = reconciled.config.calibration;
        self.dynamics = reconciled.config.dynamics;
        self.pins
            .set_mode(self.calibration.channel_id, PinMode::Analog);
        self.started = true;

        log_info!(
            "Channel {} started on pin {} ({})",
            self.instance.index(),
            self.calibration.channel_id,
            reconciled.source
        );
        Ok(reconciled)
    }

    /// Run both timers once
    ///
    /// Decays the peak if the hold interval elapsed, then samples if the
    /// poll interval elapsed. Returns `Ok(true)` when a new value was taken.
    pub fn poll(&mut self) -> Result<bool, ChannelError> {
        if !self.started {
            return Err(ChannelError::NotStarted);
        }

        let now = self.engine.now_ms();
        self.peak.tick(now, &self.dynamics);

        let sampled = self.engine.poll(now, &self.calibration, &self.dynamics)?;
        if sampled {
            self.peak
                .observe(self.engine.raw_value(), self.engine.mapped_value());
        }
        Ok(sampled)
    }

    /// Replace the dynamic parameters and persist them
    ///
    /// Returns whether storage was written. `registry` must be the one
    /// passed to [`new`](Self::new).
    pub fn reconfigure<S: NonVolatileStore>(
        &mut self,
        registry: &mut ConfigRegistry<S>,
        params: DynamicParams,
    ) -> Result<bool, ChannelError> {
        if !self.started {
            return Err(ChannelError::NotStarted);
        }
        params.validate()?;

        let config = ChannelConfig::new(self.calibration, params);
        let written = registry.store_user_data(self.instance, &config)?;
        self.dynamics = params;
        Ok(written)
    }

    /// Last calibrated value (mV)
    pub fn current_value(&self) -> f64 {
        self.engine.mapped_value()
    }

    /// Calibrated value captured with the current peak (mV)
    pub fn current_peak(&self) -> f64 {
        self.peak.peak_mapped()
    }

    /// Last raw reading
    pub fn raw_value(&self) -> u16 {
        self.engine.raw_value()
    }

    /// Decaying raw peak
    pub fn peak_raw(&self) -> f64 {
        self.peak.peak_raw()
    }

    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    pub fn dynamics(&self) -> &DynamicParams {
        &self.dynamics
    }

    /// Registry handle of this channel
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Number of channels registered with `registry`, this one included
    pub fn instance_count<S: NonVolatileStore>(&self, registry: &ConfigRegistry<S>) -> u16 {
        registry.instance_count()
    }

    /// True once [`begin`](Self::begin) succeeded
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Snapshot of the runtime state
    pub fn sample(&self) -> RuntimeSample {
        RuntimeSample {
            raw_value: self.engine.raw_value(),
            mapped_value: self.engine.mapped_value(),
            peak_raw: self.peak.peak_raw(),
            peak_mapped: self.peak.peak_mapped(),
            last_poll_ms: self.engine.last_poll_ms(),
            last_hold_ms: self.peak.last_hold_ms(),
        }
    }

    pub fn adc(&self) -> &A {
        self.engine.adc()
    }

    pub fn clock(&self) -> &C {
        self.engine.clock()
    }
}

impl<A: AnalogInput, P: PinControl, C: Clock> Drop for ChannelController<A, P, C> {
    fn drop(&mut self) {
        self.pins.set_mode(self.calibration.channel_id, PinMode::Input);
    }
}
