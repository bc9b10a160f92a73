//! Attribute-surface I/O against the simulated fabric.
//!
//! Demonstrates probe, show/store round trips, and removal quiesce. Runs
//! anywhere; no hardware involved.

use fablight_driver::fabric::map;
use fablight_driver::{Fabric, PeripheralInstance, Result, SimFabric};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("fablight_driver=debug")
        .init();

    println!("💡 Attribute Surface Demo (simulated fabric)\n");

    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = PeripheralInstance::probe(&map::PWM_RGB, 0, Fabric::Sim(sim.clone()))?;
    let attrs = pwm.attributes();

    println!("Power-on state:");
    for name in ["duty_red", "duty_green", "duty_blue", "base_period"] {
        print!("   {name:<12} = {}", attrs.show(name)?);
    }

    println!("\n📤 Fading red down, green up...");
    for step in 0..=8u32 {
        let red = 0x8000 - step * 0x1000;
        let green = step * 0x1000;
        attrs.store("duty_red", &red.to_string())?;
        attrs.store("duty_green", &green.to_string())?;
    }
    println!("   duty_red     = {}", attrs.show("duty_red")?.trim());
    println!("   duty_green   = {}", attrs.show("duty_green")?.trim());

    println!("\n📥 Stores accept kernel-style base prefixes:");
    attrs.store("base_period", "0x800")?;
    println!("   store(\"0x800\") -> base_period = {}", attrs.show("base_period")?.trim());
    attrs.store("base_period", "010")?;
    println!("   store(\"010\")   -> base_period = {} (octal)", attrs.show("base_period")?.trim());

    pwm.remove()?;
    println!("\n✅ Removed; window now reads {:?}", sim.snapshot());

    Ok(())
}
