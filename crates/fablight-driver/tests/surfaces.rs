//! End-to-end behavior of the attribute and block surfaces.
//!
//! Everything here runs against the simulated fabric, exercising the same
//! code paths the `/dev/mem` backing uses above the word accessors.

use std::io::SeekFrom;

use fablight_driver::fabric::map;
use fablight_driver::fabric::RegisterMap;
use fablight_driver::{Fabric, FablightError, PeripheralInstance, SimFabric};

fn probed(map: &'static RegisterMap, sim: &SimFabric) -> PeripheralInstance {
    PeripheralInstance::probe(map, 0, Fabric::Sim(sim.clone())).unwrap()
}

#[test]
fn power_on_state_is_visible_through_attributes() {
    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = probed(&map::PWM_RGB, &sim);
    let attrs = pwm.attributes();

    assert_eq!(attrs.show("duty_red").unwrap(), "65535\n");
    assert_eq!(attrs.show("duty_green").unwrap(), "0\n");
    assert_eq!(attrs.show("duty_blue").unwrap(), "0\n");
    assert_eq!(attrs.show("base_period").unwrap(), "4096\n");
}

#[test]
fn store_then_show_round_trips() {
    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = probed(&map::PWM_RGB, &sim);
    let attrs = pwm.attributes();

    assert_eq!(attrs.store("base_period", "4096").unwrap(), 4);
    assert_eq!(attrs.show("base_period").unwrap(), "4096\n");

    // Hex and octal prefixes, kernel-style, with a trailing newline eaten.
    assert_eq!(attrs.store("duty_red", "0x20\n").unwrap(), 5);
    assert_eq!(attrs.show("duty_red").unwrap(), "32\n");
    assert_eq!(attrs.store("duty_red", "010").unwrap(), 3);
    assert_eq!(attrs.show("duty_red").unwrap(), "8\n");
}

#[test]
fn attribute_surface_rejects_unknown_registers() {
    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = probed(&map::PWM_RGB, &sim);
    let attrs = pwm.attributes();

    assert!(matches!(
        attrs.show("frequency"),
        Err(FablightError::UnknownRegister { .. })
    ));
    assert!(matches!(
        attrs.store("frequency", "1"),
        Err(FablightError::UnknownRegister { .. })
    ));
}

#[test]
fn malformed_stores_leave_the_fabric_untouched() {
    let sim = SimFabric::for_map(&map::PWM_RGB);
    let pwm = probed(&map::PWM_RGB, &sim);
    let attrs = pwm.attributes();
    let before = sim.snapshot();

    for text in ["", "\n", "twelve", "-1", "0x", "08", "1 2", "4294967296"] {
        assert!(
            matches!(attrs.store("duty_red", text), Err(FablightError::Parse { .. })),
            "store({text:?}) should fail to parse"
        );
    }
    assert_eq!(sim.snapshot(), before);
}

#[test]
fn block_surface_streams_the_whole_window() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = probed(&map::WS2811, &sim);
    let mut session = strip.open().unwrap();

    let mut words = Vec::new();
    let mut buf = [0u8; 4];
    while session.read(&mut buf).unwrap() == 4 {
        words.push(u32::from_ne_bytes(buf));
    }
    assert_eq!(words, vec![0xFFFF, 0, 0]);
    assert_eq!(session.read(&mut buf).unwrap(), 0);
}

#[test]
fn block_and_attribute_surfaces_agree() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = probed(&map::WS2811, &sim);
    let attrs = strip.attributes();
    let mut session = strip.open().unwrap();

    session.seek(SeekFrom::Start(4)).unwrap();
    session.write(&0x00FF_0000u32.to_ne_bytes()).unwrap();
    assert_eq!(attrs.show("rgb_single").unwrap(), "16711680\n");

    attrs.store("strip_index", "17").unwrap();
    session.seek(SeekFrom::Start(8)).unwrap();
    let mut buf = [0u8; 4];
    session.read(&mut buf).unwrap();
    assert_eq!(u32::from_ne_bytes(buf), 17);
}

#[test]
fn writes_past_the_window_fail_while_reads_hit_eof() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = probed(&map::WS2811, &sim);
    let mut session = strip.open().unwrap();

    session.seek(SeekFrom::End(0)).unwrap();
    assert!(matches!(
        session.write(&1u32.to_ne_bytes()),
        Err(FablightError::OutOfRange { offset: 12, span: 12 })
    ));
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 0);
}

#[test]
fn short_transfers_are_rejected_whole() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = probed(&map::WS2811, &sim);
    let mut session = strip.open().unwrap();
    let before = sim.snapshot();

    assert!(matches!(
        session.write(&[0xAA, 0xBB]),
        Err(FablightError::ShortTransfer { needed: 4, got: 2 })
    ));
    assert_eq!(sim.snapshot(), before);

    let mut small = [0u8; 3];
    assert!(matches!(
        session.read(&mut small),
        Err(FablightError::ShortTransfer { needed: 4, got: 3 })
    ));
}

#[test]
fn all_surfaces_fail_once_the_instance_is_removed() {
    let sim = SimFabric::for_map(&map::WS2811);
    let strip = probed(&map::WS2811, &sim);
    let attrs = strip.attributes();
    let mut session = strip.open().unwrap();

    strip.remove().unwrap();

    assert!(matches!(attrs.show("rgb_all"), Err(FablightError::InstanceRemoved { .. })));
    assert!(matches!(
        attrs.store("rgb_all", "1"),
        Err(FablightError::InstanceRemoved { .. })
    ));
    let mut buf = [0u8; 4];
    assert!(matches!(session.read(&mut buf), Err(FablightError::InstanceRemoved { .. })));
    assert!(matches!(session.write(&buf), Err(FablightError::InstanceRemoved { .. })));
    assert!(matches!(strip.open(), Err(FablightError::InstanceRemoved { .. })));
}
