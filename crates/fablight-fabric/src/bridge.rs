//! HPS-to-FPGA bridge layout for the Cyclone V SoC.
//!
//! All fabric peripherals sit behind the lightweight bridge. Physical
//! addresses below come from the reference Qsys design; a devicetree `reg`
//! property overrides the Qsys offset where the two disagree.
//!
//! ```text
//! Bridge        Base         Span     Purpose
//! ──────────── ──────────── ──────── ──────────────────────────────────────
//! lightweight   0xFF200000   2 MB     Register-width peripherals (this crate)
//! hps2fpga      0xC0000000   960 MB   Wide/streaming masters (unused here)
//! ```

/// Lightweight HPS-to-FPGA bridge — all register windows live here.
pub mod lw_bridge {
    /// Physical base address of the bridge aperture.
    pub const BASE: u64 = 0xFF20_0000;
    /// Addressable span in bytes.
    pub const SPAN: u64 = 2 * 1024 * 1024; // 2 MB
}

/// Reference Qsys offsets of each peripheral within the lightweight bridge.
///
/// The three register windows were placed back to back in 16-byte slots; the
/// ADC block keeps the stock Computer System address.
pub mod qsys {
    /// RGB PWM controller window.
    pub const PWM_RGB: u64 = 0x0001_0000;
    /// Stop-button input window.
    pub const STOP_BUTTON: u64 = 0x0001_0010;
    /// WS2811 strip controller window.
    pub const WS2811: u64 = 0x0001_0020;
    /// ADC sample block.
    pub const ADC: u64 = 0x0000_4000;
}

/// Absolute physical address of a window given its bridge offset.
#[must_use]
pub const fn physical(bridge_offset: u64) -> u64 {
    lw_bridge::BASE + bridge_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_inside_bridge_span() {
        for offset in [qsys::PWM_RGB, qsys::STOP_BUTTON, qsys::WS2811, qsys::ADC] {
            assert!(offset < lw_bridge::SPAN);
        }
    }

    #[test]
    fn physical_addresses() {
        assert_eq!(physical(qsys::PWM_RGB), 0xFF21_0000);
        assert_eq!(physical(qsys::ADC), 0xFF20_4000);
    }
}
