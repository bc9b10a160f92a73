//! `strip_game` — reaction game on the WS2811 strip.
//!
//! A chaser runs along the strip; the pot on ADC channel 0 sets its step
//! delay (1..=1000 ms). Press the stop button to freeze it: catching the
//! chaser on LED 0 wins and the whole strip holds green for five seconds.
//! The latched press is written back to 0 after every round. Ctrl-C blanks
//! the strip before exiting.

use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fablight_driver::fabric::{regs, PeripheralKind};
use fablight_driver::{AccessSession, DeviceManager, Fabric, PeripheralInstance};

const CHASER_COLOR: u32 = 0xFF_0000;
const WIN_COLOR: u32 = 0x00_FF00;
const WIN_HOLD: Duration = Duration::from_secs(5);

fn attach_kind(mgr: &mut DeviceManager, kind: PeripheralKind) -> Result<PeripheralInstance> {
    let index = mgr
        .devices()
        .iter()
        .find(|d| d.kind == kind)
        .map(|d| d.index)
        .with_context(|| format!("no {} node in the devicetree", kind.device_name()))?;
    Ok(mgr.attach(index, Fabric::Devmem)?)
}

/// Step delay from the speed pot: full scale is one second per step.
fn step_delay(sample: u32) -> Duration {
    let clamped = u64::from(sample.min(regs::adc::MAX_SAMPLE));
    Duration::from_millis(1 + clamped * 999 / u64::from(regs::adc::MAX_SAMPLE))
}

/// Color one LED: rgb_single first, then the index (the cursor lands on it).
fn paint(strip: &mut AccessSession, color: u32, index: u32) -> Result<()> {
    strip.seek(SeekFrom::Start(regs::ws2811::RGB_SINGLE as u64))?;
    strip.write(&color.to_ne_bytes())?;
    strip.write(&index.to_ne_bytes())?;
    Ok(())
}

fn blank(strip: &mut AccessSession) -> Result<()> {
    strip.seek(SeekFrom::Start(0))?;
    for _ in 0..3 {
        strip.write(&0u32.to_ne_bytes())?;
    }
    Ok(())
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
    let button = attach_kind(&mut mgr, PeripheralKind::StopButton)?;
    let leds = attach_kind(&mut mgr, PeripheralKind::Ws2811)?;

    let mut samples = adc.open()?;
    let mut strip_io = leds.open()?;
    let button_attrs = button.attributes();

    // Fresh round: no stale press, dark strip.
    button_attrs.store("stop_button", "0")?;
    blank(&mut strip_io)?;
    tracing::info!("strip_game running; catch the chaser on LED 0");

    let mut buf = [0u8; 4];
    let mut position = 0u32;
    while !stop.load(Ordering::Relaxed) {
        paint(&mut strip_io, CHASER_COLOR, position)?;

        samples.seek(SeekFrom::Start(regs::adc::channel_offset(0) as u64))?;
        samples.read(&mut buf)?;
        std::thread::sleep(step_delay(u32::from_ne_bytes(buf)));

        if button_attrs.show("stop_button")? == "1\n" {
            if position == 0 {
                tracing::info!("caught on LED 0: win");
                paint(&mut strip_io, 0, position)?;
                strip_io.seek(SeekFrom::Start(regs::ws2811::RGB_ALL as u64))?;
                strip_io.write(&WIN_COLOR.to_ne_bytes())?;
                std::thread::sleep(WIN_HOLD);
                strip_io.seek(SeekFrom::Start(regs::ws2811::RGB_ALL as u64))?;
                strip_io.write(&0u32.to_ne_bytes())?;
            } else {
                tracing::info!("stopped at LED {position}: missed");
            }
            button_attrs.store("stop_button", "0")?;
        }

        // Clear the old LED, then step by two.
        paint(&mut strip_io, 0, position)?;
        position = if position > regs::ws2811::NUM_LEDS { 0 } else { position + 2 };
    }

    blank(&mut strip_io)?;
    tracing::info!("strip_game stopped; strip blanked");

    Ok(())
}
