//! `fablight` — command-line interface for the FPGA light-fabric peripherals.
//!
//! ```text
//! USAGE:
//!   fablight enumerate                           List discovered peripherals
//!   fablight info <device>                       Details for one peripheral
//!   fablight show <device> <register>            Read a register as text
//!   fablight store <device> <register> <value>   Write a register from text
//!   fablight dump <device>                       Stream the whole window
//! ```
//!
//! `<device>` is a discovery index (`0`) or a device name (`pwm_rgb`).
//! Commands attach without touching register state unless `--probe` is
//! given, which runs the power-on sequence first. `--root` points the scan
//! at a different devicetree; `--sim` backs the window with a fresh
//! simulated fabric instead of `/dev/mem` (a dry run, useful off-target).

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fablight_driver::fabric::RegisterMap;
use fablight_driver::{DeviceManager, Fabric, PeripheralInstance, SimFabric, DEVICE_TREE_ROOT};

#[derive(Parser)]
#[command(name = "fablight", about = "FPGA light-fabric peripheral CLI", version)]
struct Cli {
    /// Devicetree root to scan.
    #[arg(long, global = true, default_value = DEVICE_TREE_ROOT)]
    root: PathBuf,

    /// Back windows with a simulated fabric instead of /dev/mem (dry run).
    #[arg(long, global = true)]
    sim: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List all discovered fabric peripherals.
    Enumerate,
    /// Print detailed information for one peripheral.
    Info {
        /// Device index (e.g. 0) or name (e.g. pwm_rgb).
        device: String,
    },
    /// Read one register through the attribute surface.
    Show {
        /// Device index or name.
        device: String,
        /// Register name (e.g. duty_red).
        register: String,
        /// Run the power-on sequence instead of attaching quietly.
        #[arg(long)]
        probe: bool,
    },
    /// Write one register through the attribute surface.
    Store {
        /// Device index or name.
        device: String,
        /// Register name (e.g. base_period).
        register: String,
        /// Value in kernel base-0 notation: 42, 0x2A or 052.
        value: String,
        /// Run the power-on sequence instead of attaching quietly.
        #[arg(long)]
        probe: bool,
    },
    /// Stream every register through the block surface.
    Dump {
        /// Device index or name.
        device: String,
        /// Run the power-on sequence instead of attaching quietly.
        #[arg(long)]
        probe: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Enumerate => cmd_enumerate(&cli.root)?,
        Cmd::Info { ref device } => cmd_info(&cli.root, device)?,
        Cmd::Show { ref device, ref register, probe } => {
            cmd_show(&cli.root, device, register, probe, cli.sim)?;
        }
        Cmd::Store { ref device, ref register, ref value, probe } => {
            cmd_store(&cli.root, device, register, value, probe, cli.sim)?;
        }
        Cmd::Dump { ref device, probe } => cmd_dump(&cli.root, device, probe, cli.sim)?,
    }

    Ok(())
}

/// Accept a discovery index or a device name.
fn resolve_index(mgr: &DeviceManager, device: &str) -> Result<usize> {
    if let Ok(index) = device.parse::<usize>() {
        mgr.device(index)?;
        return Ok(index);
    }
    mgr.devices()
        .iter()
        .find(|d| d.map.name == device)
        .map(|d| d.index)
        .ok_or_else(|| anyhow::anyhow!("Device not found: {device}"))
}

fn fabric_for(map: &RegisterMap, sim: bool) -> Fabric {
    if sim {
        Fabric::Sim(SimFabric::for_map(map))
    } else {
        Fabric::Devmem
    }
}

/// Map one device's window: quiet attach by default, full probe on request.
fn open_device(
    mgr: &mut DeviceManager,
    device: &str,
    probe: bool,
    sim: bool,
) -> Result<PeripheralInstance> {
    let index = resolve_index(mgr, device)?;
    let fabric = fabric_for(mgr.device(index)?.map(), sim);
    let instance = if probe {
        mgr.probe(index, fabric)?
    } else {
        mgr.attach(index, fabric)?
    };
    Ok(instance)
}

fn cmd_enumerate(root: &Path) -> Result<()> {
    let mgr = DeviceManager::discover_at(root)?;

    println!("Fabric peripherals: {}", mgr.device_count());
    println!();

    for device in mgr.devices() {
        let registers: Vec<&str> = device.map().register_names().collect();

        println!("[{}] {} @ {:#010x}", device.index(), device.map().name, device.base());
        println!("     compatible  {}", device.map().compatible);
        println!("     span        {} bytes", device.map().span);
        println!("     registers   {}", registers.join(", "));
        println!();
    }

    Ok(())
}

fn cmd_info(root: &Path, device: &str) -> Result<()> {
    let mgr = DeviceManager::discover_at(root)?;
    let desc = mgr.device(resolve_index(&mgr, device)?)?;
    let map = desc.map();

    println!("Name       : {}", map.name);
    println!("Compatible : {}", map.compatible);
    println!("Node       : {}", desc.node().display());
    println!("Base       : {:#010x}", desc.base());
    println!("Span       : {} bytes ({} registers)", map.span, map.word_count());
    println!("Registers  :");
    for reg in map.registers {
        println!("    +{:#04x}  {}", reg.offset, reg.name);
    }
    if !map.power_on.is_empty() {
        println!("Power-on   :");
        for init in map.power_on {
            println!("    {} <- {:#x}", init.name, init.value);
        }
    }
    if !map.quiesce.is_empty() {
        println!("Quiesce    :");
        for init in map.quiesce {
            println!("    {} <- {:#x}", init.name, init.value);
        }
    }

    Ok(())
}

fn cmd_show(root: &Path, device: &str, register: &str, probe: bool, sim: bool) -> Result<()> {
    let mut mgr = DeviceManager::discover_at(root)?;
    let instance = open_device(&mut mgr, device, probe, sim)?;

    // show() output already ends with a newline.
    print!("{}", instance.attributes().show(register)?);

    Ok(())
}

fn cmd_store(
    root: &Path,
    device: &str,
    register: &str,
    value: &str,
    probe: bool,
    sim: bool,
) -> Result<()> {
    let mut mgr = DeviceManager::discover_at(root)?;
    let instance = open_device(&mut mgr, device, probe, sim)?;

    let attrs = instance.attributes();
    attrs.store(register, value)?;
    println!("{register} = {}", attrs.show(register)?.trim_end());

    Ok(())
}

fn cmd_dump(root: &Path, device: &str, probe: bool, sim: bool) -> Result<()> {
    let mut mgr = DeviceManager::discover_at(root)?;
    let instance = open_device(&mut mgr, device, probe, sim)?;
    let map = instance.map();

    let mut session = instance.open()?;
    let mut buf = [0u8; 4];
    let mut offset = 0usize;
    while session.read(&mut buf)? == 4 {
        let value = u32::from_ne_bytes(buf);
        let name = map
            .registers
            .iter()
            .find(|r| r.offset == offset)
            .map_or("", |r| r.name);
        println!("+{offset:#04x}  {value:#010x}  {name}");
        offset += 4;
    }

    Ok(())
}
