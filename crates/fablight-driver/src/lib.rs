//! Userspace driver for the FPGA light-fabric peripherals.
//!
//! This crate maps the custom Cyclone V fabric peripherals (RGB PWM
//! controller, stop-button input, WS2811 strip controller, plus the ADC
//! sample block) over `/dev/mem` and publishes the two access surfaces the
//! kernel drivers used to provide. No kernel module required.
//!
//! # Object hierarchy
//!
//! ```text
//! DeviceManager            — devicetree scan, name registry
//!   DeviceDescription      — one matched node (map + physical base)
//!   PeripheralInstance     — lifecycle: unbound → mapped → active → removed
//!     RegisterWindow       — bounds-checked 32-bit access to the window
//!       MappedWindow       — /dev/mem mapping        (hardware)
//!       SimFabric          — in-process word store    (tests, CI)
//!     AttributeSurface     — per-register text read/write ("4096\n")
//!     AccessSession        — cursor-addressed binary access, one register
//!                            per transfer
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use fablight_driver::{DeviceManager, Fabric};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut mgr = DeviceManager::discover()?;
//! for dev in mgr.devices() {
//!     println!("{}: {} @ {:#x}", dev.index, dev.map.name, dev.base);
//! }
//!
//! let pwm = mgr.probe(0, Fabric::Devmem)?;
//! let attrs = pwm.attributes();
//! attrs.store("base_period", "0x1000")?;
//! println!("duty_red = {}", attrs.show("duty_red")?);
//! # Ok(())
//! # }
//! ```
//!
//! Writes are serialized by a per-instance gate; reads go straight to the
//! fabric. Removal quiesces the peripheral's output registers and fails all
//! later access through surviving handles, while the physical mapping stays
//! alive until the last handle is gone.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod attr;
mod block;
mod discovery;
mod error;
mod instance;
pub mod mmio;
mod sim;
mod window;

/// Fabric layout constants (re-exported from fablight-fabric).
pub mod fabric {
    pub use fablight_fabric::bridge::{lw_bridge, physical, qsys};
    pub use fablight_fabric::compat::{compatible, ALL_COMPATIBLES};
    pub use fablight_fabric::map::{self, MapDefect, RegInit, Register, RegisterMap};
    pub use fablight_fabric::regs;
    pub use fablight_fabric::PeripheralKind;
}

pub use attr::{AttributeSurface, SHOW_CAPACITY};
pub use block::AccessSession;
pub use discovery::{DeviceDescription, DeviceManager, DEVICE_TREE_ROOT};
pub use error::{FablightError, Result};
pub use instance::{Lifecycle, PeripheralInstance};
pub use mmio::MappedWindow;
pub use sim::SimFabric;
pub use window::{Fabric, RegisterWindow};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AccessSession, AttributeSurface, DeviceManager, Fabric, FablightError, Lifecycle,
        PeripheralInstance, Result, SimFabric,
    };
    pub use fablight_fabric::{map, PeripheralKind};
}
