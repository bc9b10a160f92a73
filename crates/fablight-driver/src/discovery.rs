//! Devicetree discovery of fabric peripherals.
//!
//! Scans a flattened devicetree (normally `/proc/device-tree`) for nodes
//! whose `compatible` string matches one of the shipped register maps. No
//! hardcoded device lists; a peripheral exists because the loaded FPGA
//! configuration says it does.
//!
//! Each matched node contributes one [`DeviceDescription`]: the register
//! map, the absolute physical base derived from the node's `reg` property,
//! and the node path for diagnostics. The [`DeviceManager`] then turns
//! descriptions into live [`PeripheralInstance`]s and enforces that each
//! device name is published at most once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fablight_fabric::map::{self, RegisterMap};
use fablight_fabric::{bridge, PeripheralKind};

use crate::error::{FablightError, Result};
use crate::instance::PeripheralInstance;
use crate::window::Fabric;

/// Flattened devicetree root scanned by [`DeviceManager::discover`].
pub const DEVICE_TREE_ROOT: &str = "/proc/device-tree";

/// Manager for discovered peripherals and their live instances.
#[derive(Debug)]
pub struct DeviceManager {
    devices: Vec<DeviceDescription>,
    instances: HashMap<String, PeripheralInstance>,
}

/// One peripheral node found in the devicetree.
#[derive(Debug, Clone)]
pub struct DeviceDescription {
    /// Device index after sorting by physical base (0, 1, 2, ...).
    pub index: usize,

    /// Devicetree node directory the description came from.
    pub node: PathBuf,

    /// Peripheral kind, from the matched compatible string.
    pub kind: PeripheralKind,

    /// Register map describing the window.
    pub map: &'static RegisterMap,

    /// Absolute physical base address of the window.
    pub base: u64,
}

impl DeviceManager {
    /// Discover all fabric peripherals on the system.
    ///
    /// Scans `/proc/device-tree` for nodes with a known compatible string
    /// and a `reg` span matching the register map.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::NoDevicesFound`] if no node matches, or an
    /// I/O error if the devicetree cannot be read at all.
    pub fn discover() -> Result<Self> {
        Self::discover_at(Path::new(DEVICE_TREE_ROOT))
    }

    /// Discover peripherals under an explicit devicetree root.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DeviceManager::discover`].
    pub fn discover_at(root: &Path) -> Result<Self> {
        tracing::info!("Scanning {} for fabric peripherals", root.display());

        let mut devices = Vec::new();

        for entry in std::fs::read_dir(root)?.flatten() {
            let node = entry.path();
            if !node.is_dir() {
                continue;
            }

            let Some(raw) = read_property(&node, "compatible") else {
                continue;
            };
            let Some(map) = compatible_strings(&raw).find_map(map::for_compatible) else {
                continue;
            };
            let Some(kind) = PeripheralKind::from_compatible(map.compatible) else {
                continue;
            };

            let Some(raw) = read_property(&node, "reg") else {
                tracing::warn!("{}: matched node lacks a reg property", node.display());
                continue;
            };
            let Some((offset, span)) = parse_reg(&raw) else {
                tracing::warn!(
                    "{}: malformed reg property ({} bytes)",
                    node.display(),
                    raw.len()
                );
                continue;
            };
            if !usize::try_from(span).is_ok_and(|s| s == map.span) {
                tracing::warn!(
                    "{}: reg span {span:#x} does not match the {} map span {:#x}",
                    node.display(),
                    map.name,
                    map.span
                );
                continue;
            }

            let base = bridge::physical(u64::from(offset));
            tracing::debug!("{}: {} window at {base:#x}", node.display(), map.name);
            devices.push(DeviceDescription { index: 0, node, kind, map, base });
        }

        if devices.is_empty() {
            tracing::error!("No fabric peripherals found under {}", root.display());
            return Err(FablightError::NoDevicesFound);
        }

        // Directory order is arbitrary; sort by base so indices are stable.
        devices.sort_by_key(|d| d.base);
        for (index, device) in devices.iter_mut().enumerate() {
            device.index = index;
        }

        tracing::info!("Discovered {} fabric peripheral(s)", devices.len());

        Ok(Self { devices, instances: HashMap::new() })
    }

    /// Number of discovered devices.
    #[must_use]
    pub const fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// All discovered devices, ordered by physical base.
    #[must_use]
    pub fn devices(&self) -> &[DeviceDescription] {
        &self.devices
    }

    /// Description of one device by index.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::InvalidIndex`] if the index is out of bounds.
    pub fn device(&self, index: usize) -> Result<&DeviceDescription> {
        self.devices
            .iter()
            .find(|d| d.index == index)
            .ok_or(FablightError::InvalidIndex { index, count: self.devices.len() })
    }

    /// Probe one device: map its window, run power-on writes, go active.
    ///
    /// The returned instance is also retained by the manager under its
    /// device name, so [`DeviceManager::instance`] and
    /// [`DeviceManager::remove`] can reach it later.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::RegistrationFailure`] if an instance with
    /// the same device name is already registered (checked before any
    /// mapping happens), [`FablightError::InvalidIndex`] for a bad index,
    /// or a mapping error from the fabric backing.
    pub fn probe(&mut self, index: usize, fabric: Fabric) -> Result<PeripheralInstance> {
        self.register(index, fabric, true)
    }

    /// Attach to one device without disturbing its registers.
    ///
    /// Identical to [`DeviceManager::probe`] except that no power-on writes
    /// are issued; the window is mapped and the instance goes straight to
    /// active. This is the entry point for tools that inspect a peripheral
    /// another process already configured.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DeviceManager::probe`].
    pub fn attach(&mut self, index: usize, fabric: Fabric) -> Result<PeripheralInstance> {
        self.register(index, fabric, false)
    }

    /// Probe the first discovered device (lowest physical base).
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::NoDevicesFound`] if nothing was
    /// discovered, otherwise the same conditions as
    /// [`DeviceManager::probe`].
    pub fn open_first(&mut self, fabric: Fabric) -> Result<PeripheralInstance> {
        let Some(index) = self.devices.first().map(|d| d.index) else {
            return Err(FablightError::NoDevicesFound);
        };
        self.register(index, fabric, true)
    }

    /// Probe every discovered device against live fabric memory.
    ///
    /// # Errors
    ///
    /// Fails on the first device that cannot be probed; devices probed
    /// before the failure stay registered.
    pub fn probe_all(&mut self) -> Result<Vec<PeripheralInstance>> {
        (0..self.devices.len())
            .map(|index| self.probe(index, Fabric::Devmem))
            .collect()
    }

    /// Live instance registered under a device name, if any.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&PeripheralInstance> {
        self.instances.get(name)
    }

    /// Remove a registered instance: quiesce its registers and drop it
    /// from the name registry.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::InstanceRemoved`] if no instance is
    /// registered under `name`.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(instance) = self.instances.remove(name) else {
            return Err(FablightError::instance_removed(name));
        };
        instance.remove()
    }

    fn register(&mut self, index: usize, fabric: Fabric, power_on: bool) -> Result<PeripheralInstance> {
        let device = self.device(index)?;
        let (map, base) = (device.map, device.base);

        // Name collision is checked before the window is mapped, so the
        // failure path has nothing to unwind.
        if self.instances.contains_key(map.name) {
            return Err(FablightError::registration_failure(format!(
                "device name '{}' is already registered",
                map.name
            )));
        }

        let instance = if power_on {
            PeripheralInstance::probe(map, base, fabric)?
        } else {
            PeripheralInstance::attach(map, base, fabric)?
        };
        self.instances.insert(map.name.to_owned(), instance.clone());
        Ok(instance)
    }
}

impl DeviceDescription {
    /// Device index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Devicetree node this description came from.
    #[must_use]
    pub fn node(&self) -> &Path {
        &self.node
    }

    /// Peripheral kind.
    #[must_use]
    pub const fn kind(&self) -> PeripheralKind {
        self.kind
    }

    /// Register map for the window.
    #[must_use]
    pub const fn map(&self) -> &'static RegisterMap {
        self.map
    }

    /// Absolute physical base address.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }
}

fn read_property(node: &Path, name: &str) -> Option<Vec<u8>> {
    std::fs::read(node.join(name)).ok()
}

/// NUL-separated compatible list, most specific entry first.
fn compatible_strings(raw: &[u8]) -> impl Iterator<Item = &str> {
    raw.split(|byte| *byte == 0)
        .filter(|chunk| !chunk.is_empty())
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
}

/// First two big-endian cells of a `reg` property: (bridge offset, span).
fn parse_reg(raw: &[u8]) -> Option<(u32, u32)> {
    let offset = raw.get(0..4)?.try_into().ok()?;
    let span = raw.get(4..8)?.try_into().ok()?;
    Some((u32::from_be_bytes(offset), u32::from_be_bytes(span)))
}
