//! `rgb_pot` — drive the RGB PWM duties from three ADC potentiometers.
//!
//! Polls ADC channels 0..2 and linearly maps each sample onto the duty
//! range, so three pots mix the LED color directly. Ctrl-C zeroes the
//! duties before exiting.

use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fablight_driver::fabric::{regs, PeripheralKind};
use fablight_driver::{DeviceManager, Fabric, PeripheralInstance};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn attach_kind(mgr: &mut DeviceManager, kind: PeripheralKind) -> Result<PeripheralInstance> {
    let index = mgr
        .devices()
        .iter()
        .find(|d| d.kind == kind)
        .map(|d| d.index)
        .with_context(|| format!("no {} node in the devicetree", kind.device_name()))?;
    Ok(mgr.attach(index, Fabric::Devmem)?)
}

/// Map an ADC sample onto the PWM duty range.
fn sample_to_duty(sample: u32) -> u32 {
    let clamped = u64::from(sample.min(regs::adc::MAX_SAMPLE));
    (clamped * u64::from(regs::pwm_rgb::duty::MAX) / u64::from(regs::adc::MAX_SAMPLE)) as u32
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;

    let mut mgr = DeviceManager::discover()?;
    let adc = attach_kind(&mut mgr, PeripheralKind::Adc)?;
    let pwm = attach_kind(&mut mgr, PeripheralKind::PwmRgb)?;

    let mut samples = adc.open()?;
    let duties = pwm.attributes();
    duties.store("base_period", &regs::pwm_rgb::DEFAULT_BASE_PERIOD.to_string())?;
    tracing::info!("rgb_pot running; Ctrl-C stops and blanks the LED");

    let mut buf = [0u8; 4];
    while !stop.load(Ordering::Relaxed) {
        for (channel, name) in ["duty_red", "duty_green", "duty_blue"].into_iter().enumerate() {
            samples.seek(SeekFrom::Start(regs::adc::channel_offset(channel) as u64))?;
            samples.read(&mut buf)?;
            let duty = sample_to_duty(u32::from_ne_bytes(buf));
            duties.store(name, &duty.to_string())?;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    for name in ["duty_red", "duty_green", "duty_blue"] {
        duties.store(name, "0")?;
    }
    tracing::info!("rgb_pot stopped; duties zeroed");

    Ok(())
}
