//! Lifecycle transitions observed from outside the crate.

use std::path::Path;

use fablight_driver::fabric::map;
use fablight_driver::{DeviceManager, Fabric, FablightError, Lifecycle, PeripheralInstance, SimFabric};
use tempfile::TempDir;

#[test]
fn pwm_removal_quiesces_duties_but_keeps_the_period() {
    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = PeripheralInstance::probe(&map::PWM_RGB, 0, Fabric::Sim(sim.clone())).unwrap();
    assert_eq!(pwm.lifecycle(), Lifecycle::Active);

    pwm.attributes().store("duty_green", "0x4000").unwrap();
    pwm.attributes().store("base_period", "0x800").unwrap();
    pwm.remove().unwrap();

    assert_eq!(pwm.lifecycle(), Lifecycle::Removed);
    assert_eq!(sim.read32(0x0), 0, "duty_red must be driven low");
    assert_eq!(sim.read32(0x4), 0, "duty_green must be driven low");
    assert_eq!(sim.read32(0x8), 0, "duty_blue must be driven low");
    assert_eq!(sim.read32(0xC), 0x800, "base_period persists across removal");
}

#[test]
fn stop_button_removal_releases_its_own_register() {
    let sim = SimFabric::for_map(&map::STOP_BUTTON);
    let button =
        PeripheralInstance::probe(&map::STOP_BUTTON, 0, Fabric::Sim(sim.clone())).unwrap();

    // Latch a press, then tear down.
    button.attributes().store("stop_button", "1").unwrap();
    assert_eq!(sim.read32(0), 1);
    button.remove().unwrap();
    assert_eq!(sim.read32(0), 0, "removal must release the latched press");
}

#[test]
fn removing_twice_fails_the_second_time() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = PeripheralInstance::probe(&map::WS2811, 0, Fabric::Sim(sim)).unwrap();
    strip.remove().unwrap();
    assert!(matches!(strip.remove(), Err(FablightError::InstanceRemoved { .. })));
}

#[test]
fn clones_share_one_lifecycle() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = PeripheralInstance::probe(&map::WS2811, 0, Fabric::Sim(sim)).unwrap();
    let other = strip.clone();

    strip.remove().unwrap();
    assert_eq!(other.lifecycle(), Lifecycle::Removed);
    assert!(matches!(other.open(), Err(FablightError::InstanceRemoved { .. })));
}

#[test]
fn sim_fabric_outlives_the_instance_for_inspection() {
    let sim = SimFabric::for_map(&map::WS2811);
    {
        let strip =
            PeripheralInstance::probe(&map::WS2811, 0, Fabric::Sim(sim.clone())).unwrap();
        strip.attributes().store("rgb_all", "0xFF00FF").unwrap();
        strip.remove().unwrap();
    }
    // All handles are gone; the sim still holds the quiesced state.
    assert_eq!(sim.snapshot(), vec![0, 0, 0]);
}

fn reg_cells(offset: u32, span: u32) -> Vec<u8> {
    let mut raw = offset.to_be_bytes().to_vec();
    raw.extend_from_slice(&span.to_be_bytes());
    raw
}

fn write_node(root: &Path, dir: &str, compatible: &[u8], reg: &[u8]) {
    let node = root.join(dir);
    std::fs::create_dir(&node).unwrap();
    std::fs::write(node.join("compatible"), compatible).unwrap();
    std::fs::write(node.join("reg"), reg).unwrap();
}

#[test]
fn manager_probes_and_removes_a_full_tree() {
    let root = TempDir::new().unwrap();
    write_node(root.path(), "pwm_rgb@10000", b"jensen,pwm_rgb\0", &reg_cells(0x0001_0000, 16));
    write_node(
        root.path(),
        "stop_button@10010",
        b"jensen,stop_button\0",
        &reg_cells(0x0001_0010, 16),
    );
    write_node(root.path(), "ws2811@10020", b"jensen,ws2811\0", &reg_cells(0x0001_0020, 12));

    let mut manager = DeviceManager::discover_at(root.path()).unwrap();
    assert_eq!(manager.device_count(), 3);

    let sims: Vec<SimFabric> = manager
        .devices()
        .iter()
        .map(|d| SimFabric::for_map(d.map))
        .collect();
    for (index, sim) in sims.iter().enumerate() {
        manager.probe(index, Fabric::Sim(sim.clone())).unwrap();
    }
    for name in ["pwm_rgb", "stop_button", "ws2811"] {
        assert!(manager.instance(name).is_some(), "{name} should be registered");
        manager.remove(name).unwrap();
        assert!(manager.instance(name).is_none());
    }
}
