//! Block-surface streaming against the simulated fabric.
//!
//! One register per transfer, native byte order, EOF past the end.

use std::io::SeekFrom;

use fablight_driver::fabric::map;
use fablight_driver::{Fabric, PeripheralInstance, Result, SimFabric};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("fablight_driver=trace")
        .init();

    println!("💡 Block Surface Demo (simulated fabric)\n");

    let sim = SimFabric::for_map(&map::WS2811);
    let strip = PeripheralInstance::probe(&map::WS2811, 0, Fabric::Sim(sim))?;
    let mut session = strip.open()?;

    println!("📥 Streaming the window, one register per read:");
    let mut buf = [0u8; 4];
    let mut offset = 0;
    while session.read(&mut buf)? == 4 {
        println!("   +{offset:#04x}: {:#010x}", u32::from_ne_bytes(buf));
        offset += 4;
    }

    println!("\n📤 Lighting LED 3 teal (color first, then the index):");
    session.seek(SeekFrom::Start(4))?;
    session.write(&0x0000_8080u32.to_ne_bytes())?; // rgb_single, 0xRRGGBB
    session.write(&3u32.to_ne_bytes())?; // cursor landed on strip_index

    session.seek(SeekFrom::Start(0))?;
    let mut offset = 0;
    while session.read(&mut buf)? == 4 {
        println!("   +{offset:#04x}: {:#010x}", u32::from_ne_bytes(buf));
        offset += 4;
    }

    let eof = session.read(&mut buf)?;
    println!("\nPast the end: read returns {eof} bytes (EOF)");

    strip.remove()?;
    println!("✅ Done");

    Ok(())
}
