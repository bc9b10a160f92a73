//! Enumerate fabric peripherals described by the devicetree.
//!
//! Run on the target; anywhere else this reports no peripherals.

use fablight_driver::{DeviceManager, Result};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("fablight_driver=debug")
        .init();

    println!("💡 Fabric Peripheral Enumeration\n");

    let manager = DeviceManager::discover()?;
    println!("Found {} peripheral(s):\n", manager.device_count());

    for device in manager.devices() {
        let registers: Vec<&str> = device.map().register_names().collect();

        println!("📟 Device {}:", device.index());
        println!("   Name:        {}", device.map().name);
        println!("   Compatible:  {}", device.map().compatible);
        println!("   Base:        {:#010x}", device.base());
        println!("   Span:        {} bytes", device.map().span);
        println!("   Registers:   {}", registers.join(", "));
        println!("   Node:        {}", device.node().display());
        println!();
    }

    println!("✅ Discovery complete");

    Ok(())
}
