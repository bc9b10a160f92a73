//! Validated register window access.
//!
//! [`RegisterWindow`] is the single choke point for register traffic: every
//! surface resolves names here and every access passes the same bounds and
//! alignment checks before it touches the fabric. Peripheral-specific code
//! supplies only a [`RegisterMap`].

use fablight_fabric::RegisterMap;

use crate::error::{FablightError, Result};
use crate::mmio::MappedWindow;
use crate::sim::SimFabric;

/// How a peripheral's window reaches its registers.
#[derive(Debug)]
pub enum Fabric {
    /// Physical fabric through a `/dev/mem` mapping.
    Devmem,
    /// In-process simulated fabric.
    Sim(SimFabric),
}

/// The window's storage, selected at open time.
#[derive(Debug)]
enum Backing {
    Devmem(MappedWindow),
    Sim(SimFabric),
}

/// One peripheral's register window.
///
/// Offsets are validated against the map's span and the 4-byte register
/// width; a violation fails the access without touching the fabric.
#[derive(Debug)]
pub struct RegisterWindow {
    backing: Backing,
    map: &'static RegisterMap,
}

impl RegisterWindow {
    /// Open the window described by `map` through the chosen fabric.
    ///
    /// `base` is the physical address of the window; ignored for a sim
    /// fabric, which carries its own storage.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::MapFailure`] if the devmem mapping fails or
    /// the sim fabric is smaller than the window.
    pub fn open(map: &'static RegisterMap, base: u64, fabric: Fabric) -> Result<Self> {
        let backing = match fabric {
            Fabric::Devmem => Backing::Devmem(MappedWindow::map(base, map.span)?),
            Fabric::Sim(sim) => {
                if sim.span() < map.span {
                    return Err(FablightError::map_failure(format!(
                        "sim fabric spans {} bytes, window '{}' needs {}",
                        sim.span(),
                        map.name,
                        map.span
                    )));
                }
                Backing::Sim(sim)
            }
        };
        Ok(Self { backing, map })
    }

    /// Range check first, then alignment, matching the block surface's
    /// past-end-dominates ordering.
    fn check(&self, offset: usize) -> Result<()> {
        if offset >= self.map.span {
            return Err(FablightError::out_of_range(offset, self.map.span));
        }
        if offset % 4 != 0 {
            return Err(FablightError::unaligned(offset));
        }
        Ok(())
    }

    /// Read the 32-bit register at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::OutOfRange`] or [`FablightError::Unaligned`]
    /// without touching the fabric.
    pub fn read32(&self, offset: usize) -> Result<u32> {
        self.check(offset)?;
        let value = match &self.backing {
            Backing::Devmem(window) => window.read32(offset),
            Backing::Sim(sim) => sim.read32(offset),
        };
        tracing::trace!("{}+{offset:#x} -> {value:#x}", self.map.name);
        Ok(value)
    }

    /// Write the 32-bit register at `offset`. The unit of access is always
    /// one whole register; there are no partial-width stores.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::OutOfRange`] or [`FablightError::Unaligned`]
    /// without touching the fabric.
    pub fn write32(&self, offset: usize, value: u32) -> Result<()> {
        self.check(offset)?;
        tracing::trace!("{}+{offset:#x} <- {value:#x}", self.map.name);
        match &self.backing {
            Backing::Devmem(window) => window.write32(offset, value),
            Backing::Sim(sim) => sim.write32(offset, value),
        }
        Ok(())
    }

    /// Byte offset of a named register.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::UnknownRegister`] if the map lacks `name`.
    pub fn lookup(&self, name: &str) -> Result<usize> {
        self.map
            .offset_of(name)
            .ok_or_else(|| FablightError::unknown_register(name))
    }

    /// Window span in bytes.
    #[must_use]
    pub const fn span(&self) -> usize {
        self.map.span
    }

    /// The register map this window serves.
    #[must_use]
    pub const fn map(&self) -> &'static RegisterMap {
        self.map
    }
}
