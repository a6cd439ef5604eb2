//! Build script for peakhold-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates channels.toml and turns it into Rust constants

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// ADC-capable pins on RP2040
const ADC_PINS: [i64; 4] = [26, 27, 28, 29];

/// Must not exceed the ADC pin count
const MAX_CHANNELS: usize = 4;

fn main() {
    setup_linker();
    generate_channels();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate channels.toml and write `channels.rs` to OUT_DIR
fn generate_channels() {
    println!("cargo:rerun-if-changed=channels.toml");

    let config_path = Path::new("channels.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail(&[format!("Failed to read channels.toml: {}", e)]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(&[format!("Invalid TOML syntax in channels.toml: {}", e)]),
    };

    let channels = match config.get("channel") {
        Some(toml::Value::Array(channels)) if !channels.is_empty() => channels,
        _ => fail(&["Missing [[channel]] section - at least one channel is required".into()]),
    };

    let mut errors = Vec::new();
    if channels.len() > MAX_CHANNELS {
        errors.push(format!("At most {} channels are supported", MAX_CHANNELS));
    }

    let mut entries = Vec::new();
    let mut seen_pins = Vec::new();
    for (index, channel) in channels.iter().enumerate() {
        match validate_channel(index, channel, &mut errors) {
            Some(entry) => {
                if seen_pins.contains(&entry.pin) {
                    errors.push(format!("[[channel]] #{}: pin {} used twice", index, entry.pin));
                }
                seen_pins.push(entry.pin);
                entries.push(entry);
            }
            None => continue,
        }
    }

    if !errors.is_empty() {
        fail(&errors);
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("channels.rs"), render(&entries)).unwrap();
    println!("cargo:warning=channels.toml validated: {} channel(s)", entries.len());
}

/// One validated `[[channel]]` table
struct ChannelEntry {
    pin: i64,
    sample_count: i64,
    sample_period_us: i64,
    zero_offset_mv: f32,
    slope: f32,
    adc_resolution: &'static str,
    supply_voltage: &'static str,
    poll_interval_ms: i64,
    hold_interval_ms: i64,
    decay_model: &'static str,
    decay_rate: f32,
}

fn validate_channel(
    index: usize,
    channel: &toml::Value,
    errors: &mut Vec<String>,
) -> Option<ChannelEntry> {
    let table = match channel {
        toml::Value::Table(t) => t,
        _ => {
            errors.push(format!("[[channel]] #{} must be a table", index));
            return None;
        }
    };
    let start = errors.len();

    let int = |key: &str, max: i64, errors: &mut Vec<String>| match table.get(key) {
        Some(toml::Value::Integer(v)) if (0..=max).contains(v) => *v,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[[channel]] #{}: '{}' must be 0-{}", index, key, max));
            0
        }
        _ => {
            errors.push(format!("[[channel]] #{}: missing integer '{}'", index, key));
            0
        }
    };
    // Checked after narrowing, the firmware only ever sees the f32 value
    let float = |key: &str, errors: &mut Vec<String>| match table.get(key) {
        Some(toml::Value::Float(v)) => *v as f32,
        Some(toml::Value::Integer(v)) => *v as f32,
        _ => {
            errors.push(format!("[[channel]] #{}: missing number '{}'", index, key));
            0.0
        }
    };

    let pin = int("pin", u16::MAX as i64, errors);
    if !ADC_PINS.contains(&pin) {
        errors.push(format!("[[channel]] #{}: pin must be 26-29 (ADC0-ADC3)", index));
    }

    let sample_count = int("sample_count", u16::MAX as i64, errors);
    let sample_period_us = int("sample_period_us", u16::MAX as i64, errors);
    let poll_interval_ms = int("poll_interval_ms", u16::MAX as i64, errors);
    let hold_interval_ms = int("hold_interval_ms", u16::MAX as i64, errors);

    let zero_offset_mv = float("zero_offset_mv", errors);
    if !(zero_offset_mv >= 0.0 && zero_offset_mv.is_finite()) {
        errors.push(format!("[[channel]] #{}: zero_offset_mv must be >= 0", index));
    }
    let slope = float("slope", errors);
    if !(slope > 0.0 && slope.is_finite()) {
        errors.push(format!("[[channel]] #{}: slope must be > 0", index));
    }

    let adc_resolution = match int("adc_resolution", u16::MAX as i64, errors) {
        1023 => "Bits10",
        4095 => "Bits12",
        8191 => "Bits13",
        65535 => "Bits16",
        _ => {
            errors.push(format!(
                "[[channel]] #{}: adc_resolution must be 1023, 4095, 8191 or 65535",
                index
            ));
            "Bits12"
        }
    };
    let supply_voltage = match int("supply_voltage_mv", u16::MAX as i64, errors) {
        3300 => "Mv3300",
        5000 => "Mv5000",
        _ => {
            errors.push(format!("[[channel]] #{}: supply_voltage_mv must be 3300 or 5000", index));
            "Mv3300"
        }
    };

    let decay_rate = float("decay_rate", errors);
    let decay_model = match table.get("decay_model") {
        Some(toml::Value::String(m)) if m == "linear" => {
            if !(decay_rate > 0.0 && decay_rate < 1.0) {
                errors.push(format!("[[channel]] #{}: linear decay_rate must be 0-1", index));
            }
            "Linear"
        }
        Some(toml::Value::String(m)) if m == "exponential" => {
            if !(decay_rate > 0.0 && decay_rate.is_finite()) {
                errors.push(format!("[[channel]] #{}: decay_rate must be > 0", index));
            }
            "Exponential"
        }
        _ => {
            errors.push(format!(
                "[[channel]] #{}: decay_model must be 'linear' or 'exponential'",
                index
            ));
            "Linear"
        }
    };

    if errors.len() > start {
        return None;
    }
    Some(ChannelEntry {
        pin,
        sample_count,
        sample_period_us,
        zero_offset_mv,
        slope,
        adc_resolution,
        supply_voltage,
        poll_interval_ms,
        hold_interval_ms,
        decay_model,
        decay_rate,
    })
}

/// Render the validated channels as a `CHANNELS` constant
fn render(entries: &[ChannelEntry]) -> String {
    let mut out = String::new();
    writeln!(out, "// Generated from channels.toml by build.rs").unwrap();
    writeln!(out, "pub const CHANNEL_COUNT: usize = {};", entries.len()).unwrap();
    writeln!(out, "pub const CHANNELS: [ChannelConfig; CHANNEL_COUNT] = [").unwrap();
    for e in entries {
        writeln!(
            out,
            "    ChannelConfig::new(
        CalibrationData {{
            channel_id: {},
            sample_count: {},
            sample_period_us: {},
            zero_offset_mv: {:?},
            slope: {:?},
        }},
        DynamicParams {{
            adc_resolution: AdcResolution::{},
            supply_voltage: SupplyVoltage::{},
            poll_interval_ms: {},
            hold_interval_ms: {},
            decay_model: DecayModel::{},
            decay_rate: {:?},
        }},
    ),",
            e.pin,
            e.sample_count,
            e.sample_period_us,
            e.zero_offset_mv,
            e.slope,
            e.adc_resolution,
            e.supply_voltage,
            e.poll_interval_ms,
            e.hold_interval_ms,
            e.decay_model,
            e.decay_rate,
        )
        .unwrap();
    }
    writeln!(out, "];").unwrap();
    out
}

/// Abort the build with a boxed error listing
fn fail(errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid channels.toml                                    ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}
