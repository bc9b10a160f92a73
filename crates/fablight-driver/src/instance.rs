//! Peripheral instance lifecycle.
//!
//! A [`PeripheralInstance`] owns one register window, one write gate, and
//! the lifecycle state both surfaces consult. It is a cheap cloneable handle
//! over shared state: surfaces and block sessions hold their own clones, so
//! a session that outlives [`remove`](PeripheralInstance::remove) keeps the
//! mapping alive but every access through it fails with
//! [`FablightError::InstanceRemoved`]. The physical unmap happens when the
//! last handle drops.
//!
//! Lifecycle: `Unbound -> Mapped -> Active -> Removed`, with `Removed`
//! terminal. A failed probe never leaves a partially visible instance; the
//! window unmaps on the error path as the handles unwind.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fablight_fabric::RegisterMap;

use crate::attr::AttributeSurface;
use crate::block::AccessSession;
use crate::error::{FablightError, Result};
use crate::window::{Fabric, RegisterWindow};

/// Lifecycle state of a peripheral instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    /// Constructed, window not yet mapped.
    Unbound = 0,
    /// Window mapped, registers not yet initialized.
    Mapped = 1,
    /// Surfaces live; the instance serves access.
    Active = 2,
    /// Quiesced and logically invalid. Terminal.
    Removed = 3,
}

impl Lifecycle {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unbound,
            1 => Self::Mapped,
            2 => Self::Active,
            _ => Self::Removed,
        }
    }
}

/// State shared by an instance and every surface handle derived from it.
#[derive(Debug)]
pub(crate) struct InstanceShared {
    pub(crate) window: RegisterWindow,
    gate: Mutex<()>,
    state: AtomicU8,
}

impl InstanceShared {
    pub(crate) fn map(&self) -> &'static RegisterMap {
        self.window.map()
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Fail unless the instance is still serving access.
    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.lifecycle() == Lifecycle::Active {
            Ok(())
        } else {
            Err(FablightError::instance_removed(self.map().name))
        }
    }

    /// Acquire the exclusive write gate.
    ///
    /// The gate guards no data of its own, so a poisoned lock is still a
    /// valid gate; recover the guard instead of propagating the panic.
    pub(crate) fn lock_gate(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for InstanceShared {
    fn drop(&mut self) {
        // Safety net for handles dropped without an explicit remove(). A
        // Mapped instance (failed probe) unwinds without register writes.
        if self.lifecycle() == Lifecycle::Active {
            tracing::warn!("{} dropped while active; quiescing", self.map().name);
            for init in self.map().quiesce {
                if let Ok(offset) = self.window.lookup(init.name) {
                    let _ = self.window.write32(offset, init.value);
                }
            }
        }
    }
}

/// Handle to one live peripheral instance.
///
/// Clones share the same window, gate, and lifecycle state.
#[derive(Debug, Clone)]
pub struct PeripheralInstance {
    shared: Arc<InstanceShared>,
}

impl PeripheralInstance {
    /// Discover-and-bring-up: map the window, write the map's power-on
    /// defaults, and go active.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::MapFailure`] for a structurally defective
    /// map or a failed mapping. Nothing stays mapped on the error path.
    pub fn probe(map: &'static RegisterMap, base: u64, fabric: Fabric) -> Result<Self> {
        tracing::debug!("Probing {} at {base:#x}", map.name);
        let instance = Self::bind(map, base, fabric)?;

        // Mapped -> Active: peripheral-specific power-on values.
        for init in map.power_on {
            let offset = instance.shared.window.lookup(init.name)?;
            instance.shared.window.write32(offset, init.value)?;
        }
        instance
            .shared
            .state
            .store(Lifecycle::Active as u8, Ordering::Release);

        tracing::info!(
            "{} active ({} registers, span {} bytes)",
            map.name,
            map.registers.len(),
            map.span
        );
        Ok(instance)
    }

    /// Join an already-initialized peripheral: map the window and go active
    /// without touching any register.
    ///
    /// Control programs use this to reach a fabric the platform probe has
    /// already brought up.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`probe`](Self::probe).
    pub fn attach(map: &'static RegisterMap, base: u64, fabric: Fabric) -> Result<Self> {
        tracing::debug!("Attaching to {} at {base:#x}", map.name);
        let instance = Self::bind(map, base, fabric)?;
        instance
            .shared
            .state
            .store(Lifecycle::Active as u8, Ordering::Release);
        Ok(instance)
    }

    /// Unbound -> Mapped.
    fn bind(map: &'static RegisterMap, base: u64, fabric: Fabric) -> Result<Self> {
        map.validate().map_err(|defect| {
            FablightError::map_failure(format!("register map defect: {defect}"))
        })?;
        let window = RegisterWindow::open(map, base, fabric)?;
        Ok(Self {
            shared: Arc::new(InstanceShared {
                window,
                gate: Mutex::new(()),
                state: AtomicU8::new(Lifecycle::Mapped as u8),
            }),
        })
    }

    /// Active -> Removed: close both surfaces and drive the map's quiesce
    /// values under the gate.
    ///
    /// In-flight writers that already passed the state check block on the
    /// gate and re-check it once inside, so no write lands after the
    /// quiesce values.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::InstanceRemoved`] if the instance was
    /// already removed.
    pub fn remove(&self) -> Result<()> {
        let _gate = self.shared.lock_gate();
        let prior = self
            .shared
            .state
            .swap(Lifecycle::Removed as u8, Ordering::AcqRel);
        if Lifecycle::from_u8(prior) == Lifecycle::Removed {
            return Err(FablightError::instance_removed(self.shared.map().name));
        }

        for init in self.shared.map().quiesce {
            let offset = self.shared.window.lookup(init.name)?;
            self.shared.window.write32(offset, init.value)?;
        }
        tracing::info!("Removed {}", self.shared.map().name);
        Ok(())
    }

    /// The attribute surface: named textual show/store per register.
    #[must_use]
    pub fn attributes(&self) -> AttributeSurface {
        AttributeSurface::new(Arc::clone(&self.shared))
    }

    /// Open a block-surface session with its cursor at 0.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::InstanceRemoved`] once the instance has been
    /// removed.
    pub fn open(&self) -> Result<AccessSession> {
        self.shared.ensure_active()?;
        Ok(AccessSession::new(Arc::clone(&self.shared)))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle()
    }

    /// The register map this instance serves.
    #[must_use]
    pub fn map(&self) -> &'static RegisterMap {
        self.shared.map()
    }

    /// Device name of this instance.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.shared.map().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimFabric;
    use fablight_fabric::map;
    use fablight_fabric::{Register, RegisterMap};

    #[test]
    fn probe_applies_power_on_defaults() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let instance =
            PeripheralInstance::probe(&map::PWM_RGB, 0, Fabric::Sim(sim.clone())).unwrap();
        assert_eq!(instance.lifecycle(), Lifecycle::Active);
        assert_eq!(sim.read32(0x0), 0xFFFF);
        assert_eq!(sim.read32(0x4), 0);
        assert_eq!(sim.read32(0x8), 0);
        assert_eq!(sim.read32(0xC), 0x1000);
    }

    #[test]
    fn attach_leaves_registers_alone() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        sim.write32(0x0, 0x1234);
        sim.write32(0xC, 0x2000);
        let instance =
            PeripheralInstance::attach(&map::PWM_RGB, 0, Fabric::Sim(sim.clone())).unwrap();
        assert_eq!(instance.lifecycle(), Lifecycle::Active);
        assert_eq!(sim.read32(0x0), 0x1234);
        assert_eq!(sim.read32(0xC), 0x2000);
    }

    #[test]
    fn remove_quiesces_and_closes() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let instance =
            PeripheralInstance::probe(&map::PWM_RGB, 0, Fabric::Sim(sim.clone())).unwrap();
        instance.remove().unwrap();

        assert_eq!(instance.lifecycle(), Lifecycle::Removed);
        assert_eq!(sim.read32(0x0), 0);
        assert_eq!(sim.read32(0x4), 0);
        assert_eq!(sim.read32(0x8), 0);
        // The base period is not in the quiesce table and keeps its value.
        assert_eq!(sim.read32(0xC), 0x1000);

        assert!(matches!(
            instance.open(),
            Err(FablightError::InstanceRemoved { .. })
        ));
        assert!(matches!(
            instance.remove(),
            Err(FablightError::InstanceRemoved { .. })
        ));
    }

    #[test]
    fn clones_share_lifecycle() {
        let sim = SimFabric::for_map(&map::STOP_BUTTON);
        let instance =
            PeripheralInstance::probe(&map::STOP_BUTTON, 0, Fabric::Sim(sim)).unwrap();
        let clone = instance.clone();
        instance.remove().unwrap();
        assert_eq!(clone.lifecycle(), Lifecycle::Removed);
    }

    #[test]
    fn defective_map_fails_probe() {
        static BAD: RegisterMap = RegisterMap {
            name: "bad",
            compatible: "test,bad",
            span: 16,
            registers: &[
                Register { name: "a", offset: 0 },
                Register { name: "b", offset: 0 },
            ],
            power_on: &[],
            quiesce: &[],
        };
        let err = PeripheralInstance::probe(&BAD, 0, Fabric::Sim(SimFabric::new(16)))
            .unwrap_err();
        assert!(matches!(err, FablightError::MapFailure { .. }));
    }
}
