//! Peakhold - analog peak-hold sampling firmware
//!
//! Samples the ADC channels listed in channels.toml, keeps a decaying
//! peak per channel and persists each channel's configuration to an
//! EEPROM emulated in the last flash sector.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::gpio::Pull;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Timer;
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use peakhold_core::registry::ConfigRegistry;
use peakhold_core::ChannelController;
use peakhold_hal_rp2040::adc::AdcMutex;
use peakhold_hal_rp2040::{EmbassyClock, FlashEeprom, RpAnalogInput, SharedAdc};

mod channels;

use channels::{CHANNELS, CHANNEL_COUNT};

/// Main loop period
const TICK_MS: u64 = 1;

type Controller = ChannelController<SharedAdc<'static, 'static>, SharedAdc<'static, 'static>, EmbassyClock>;

// Static cells for peripherals shared by all channels (must live forever)
static EEPROM: StaticCell<FlashEeprom<'static>> = StaticCell::new();
static ADC: StaticCell<AdcMutex<'static>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Peakhold firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Bind the ADC pins named in channels.toml
    let mut analog = RpAnalogInput::new(Adc::new_blocking(p.ADC, AdcConfig::default()));
    let mut pins = (Some(p.PIN_26), Some(p.PIN_27), Some(p.PIN_28), Some(p.PIN_29));
    for defaults in CHANNELS.iter() {
        let pin = defaults.calibration.channel_id;
        let channel = match pin {
            26 => pins.0.take().map(|p| Channel::new_pin(p, Pull::None)),
            27 => pins.1.take().map(|p| Channel::new_pin(p, Pull::None)),
            28 => pins.2.take().map(|p| Channel::new_pin(p, Pull::None)),
            29 => pins.3.take().map(|p| Channel::new_pin(p, Pull::None)),
            _ => None,
        };
        match channel.map(|ch| analog.bind(pin, ch)) {
            Some(Ok(())) => {}
            _ => warn!("Could not bind ADC pin {}", pin),
        }
    }
    let adc: &'static AdcMutex<'static> = ADC.init(Mutex::new(RefCell::new(analog)));

    let eeprom = EEPROM.init(FlashEeprom::new(p.FLASH));
    let mut registry = ConfigRegistry::new(eeprom);

    let mut controllers: Vec<Controller, CHANNEL_COUNT> = Vec::new();
    for defaults in CHANNELS.iter() {
        let controller = ChannelController::new(
            defaults.calibration,
            &mut registry,
            SharedAdc::new(adc),
            SharedAdc::new(adc),
            EmbassyClock,
        );
        let mut controller = match controller {
            Ok(c) => c,
            Err(e) => {
                error!("Channel on pin {} rejected: {}", defaults.calibration.channel_id, e);
                continue;
            }
        };

        match controller.begin(&mut registry, defaults.dynamics) {
            Ok(reconciled) => info!(
                "Channel {} on pin {}: {} configuration, poll {}ms, hold {}ms",
                controller.instance().index(),
                controller.calibration().channel_id,
                reconciled.source,
                controller.dynamics().poll_interval_ms,
                controller.dynamics().hold_interval_ms
            ),
            Err(e) => {
                error!("Channel on pin {} failed to start: {}", defaults.calibration.channel_id, e);
                continue;
            }
        }

        if controllers.push(controller).is_err() {
            warn!("Too many channels");
        }
    }
    info!(
        "{} of {} channels running, {} EEPROM writes this boot",
        controllers.len(),
        registry.instance_count(),
        registry.writes_this_session()
    );

    loop {
        for controller in controllers.iter_mut() {
            match controller.poll() {
                Ok(true) => debug!(
                    "pin {}: raw={} value={}mV peak={}mV",
                    controller.calibration().channel_id,
                    controller.raw_value(),
                    controller.current_value(),
                    controller.current_peak()
                ),
                Ok(false) => {}
                Err(e) => warn!(
                    "pin {}: poll failed: {}",
                    controller.calibration().channel_id,
                    e
                ),
            }
        }
        Timer::after_millis(TICK_MS).await;
    }
}
