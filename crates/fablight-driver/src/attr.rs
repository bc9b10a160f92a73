//! Attribute surface: named textual register access.
//!
//! One show/store endpoint per named register. Values cross as text the way
//! the sysfs convention has it: show is unsigned decimal with a trailing
//! newline; store accepts standard base prefixes and tolerates a single
//! trailing newline, so `echo 4096 > duty_red` just works.

use std::sync::Arc;

use crate::error::{FablightError, Result};
use crate::instance::InstanceShared;

/// Show output capacity, matching the page-sized buffer of the sysfs
/// convention. A `u32` never comes close, but the contract caps it.
pub const SHOW_CAPACITY: usize = 4096;

/// Named textual read/write endpoints for one peripheral instance.
#[derive(Debug)]
pub struct AttributeSurface {
    shared: Arc<InstanceShared>,
}

impl AttributeSurface {
    pub(crate) fn new(shared: Arc<InstanceShared>) -> Self {
        Self { shared }
    }

    /// Names of the registers this surface exposes, in window order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.shared.map().register_names()
    }

    /// Read register `name`, formatted as unsigned decimal with a trailing
    /// newline.
    ///
    /// # Errors
    ///
    /// [`FablightError::UnknownRegister`] for a name the map lacks,
    /// [`FablightError::InstanceRemoved`] once the instance is gone.
    pub fn show(&self, name: &str) -> Result<String> {
        self.shared.ensure_active()?;
        let offset = self.shared.window.lookup(name)?;
        let value = self.shared.window.read32(offset)?;
        let mut text = format!("{value}\n");
        text.truncate(SHOW_CAPACITY);
        Ok(text)
    }

    /// Parse `text` and store it into register `name` under the write gate.
    ///
    /// Returns the number of input bytes consumed (the full text length,
    /// newline included).
    ///
    /// # Errors
    ///
    /// [`FablightError::Parse`] for malformed text, without touching the
    /// register; [`FablightError::UnknownRegister`] and
    /// [`FablightError::InstanceRemoved`] as for [`show`](Self::show).
    pub fn store(&self, name: &str, text: &str) -> Result<usize> {
        self.shared.ensure_active()?;
        let offset = self.shared.window.lookup(name)?;
        // Parse before taking the gate; the critical section is one store.
        let value = parse_u32(text)?;

        let _gate = self.shared.lock_gate();
        // A concurrent remove() may have won the gate first.
        self.shared.ensure_active()?;
        self.shared.window.write32(offset, value)?;
        Ok(text.len())
    }
}

/// Parse an unsigned register value with base-0 semantics: an optional
/// leading `+`, then `0x`/`0X` selects hex, a leading `0` selects octal,
/// anything else is decimal. At most one trailing newline is tolerated.
fn parse_u32(text: &str) -> Result<u32> {
    let mut s = text.strip_suffix('\n').unwrap_or(text);
    s = s.strip_prefix('+').unwrap_or(s);

    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (s, 8)
    } else {
        (s, 10)
    };

    if digits.is_empty() {
        return Err(FablightError::parse(text));
    }
    let mut value: u32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix).ok_or_else(|| FablightError::parse(text))?;
        value = value
            .checked_mul(radix)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| FablightError::parse(text))?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PeripheralInstance;
    use crate::sim::SimFabric;
    use crate::window::Fabric;
    use fablight_fabric::map;

    fn pwm_attrs(sim: &SimFabric) -> AttributeSurface {
        PeripheralInstance::probe(&map::PWM_RGB, 0, Fabric::Sim(sim.clone()))
            .unwrap()
            .attributes()
    }

    #[test]
    fn show_formats_decimal_newline() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let attrs = pwm_attrs(&sim);
        assert_eq!(attrs.show("duty_red").unwrap(), "65535\n");
        assert_eq!(attrs.show("base_period").unwrap(), "4096\n");
    }

    #[test]
    fn store_then_show_round_trips() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let attrs = pwm_attrs(&sim);
        let consumed = attrs.store("duty_red", "4096").unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(attrs.show("duty_red").unwrap(), "4096\n");
    }

    #[test]
    fn store_consumes_trailing_newline() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let attrs = pwm_attrs(&sim);
        assert_eq!(attrs.store("duty_green", "0x20\n").unwrap(), 5);
        assert_eq!(attrs.show("duty_green").unwrap(), "32\n");
    }

    #[test]
    fn unknown_register_rejected() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let attrs = pwm_attrs(&sim);
        assert!(matches!(
            attrs.show("duty_white"),
            Err(FablightError::UnknownRegister { .. })
        ));
        assert!(matches!(
            attrs.store("duty_white", "1"),
            Err(FablightError::UnknownRegister { .. })
        ));
    }

    #[test]
    fn malformed_store_leaves_register_untouched() {
        let sim = SimFabric::for_map(&map::PWM_RGB);
        let attrs = pwm_attrs(&sim);
        let before = sim.snapshot();
        for bad in ["", "twelve", "-1", "0x", "4096 extra", "99999999999"] {
            assert!(matches!(
                attrs.store("duty_red", bad),
                Err(FablightError::Parse { .. })
            ));
        }
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn parse_bases_and_signs() {
        assert_eq!(parse_u32("4096").unwrap(), 4096);
        assert_eq!(parse_u32("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_u32("0X1F").unwrap(), 0x1F);
        assert_eq!(parse_u32("010").unwrap(), 8);
        assert_eq!(parse_u32("0").unwrap(), 0);
        assert_eq!(parse_u32("+5").unwrap(), 5);
        assert_eq!(parse_u32("4294967295").unwrap(), u32::MAX);
        assert_eq!(parse_u32("12\n").unwrap(), 12);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in [
            "", "\n", "+", "0x", "0xG", "08", "1 2", "++5", "-1", "12\n\n", "4294967296",
        ] {
            assert!(parse_u32(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn surfaces_fail_after_removal() {
        let sim = SimFabric::for_map(&map::STOP_BUTTON);
        let instance =
            PeripheralInstance::probe(&map::STOP_BUTTON, 0, Fabric::Sim(sim)).unwrap();
        let attrs = instance.attributes();
        instance.remove().unwrap();
        assert!(matches!(
            attrs.show("stop_button"),
            Err(FablightError::InstanceRemoved { .. })
        ));
        assert!(matches!(
            attrs.store("stop_button", "0"),
            Err(FablightError::InstanceRemoved { .. })
        ));
    }
}
