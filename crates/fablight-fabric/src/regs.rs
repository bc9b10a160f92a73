//! Register layout of each fabric peripheral.
//!
//! Offsets are bytes from the start of the peripheral's window. Every
//! register is 32 bits wide and sits on a 4-byte boundary; the window spans
//! below are what the Qsys components decode (the PWM and button windows
//! round up to a 16-byte slot, the WS2811 decodes exactly its three words).

/// RGB PWM controller.
///
/// Three independent duty-cycle registers share one base period. The fabric
/// compares each duty against the free-running period counter; software only
/// ever writes whole registers.
pub mod pwm_rgb {
    /// Red channel duty cycle.
    pub const DUTY_RED: usize = 0x0;
    /// Green channel duty cycle.
    pub const DUTY_GREEN: usize = 0x4;
    /// Blue channel duty cycle.
    pub const DUTY_BLUE: usize = 0x8;
    /// Shared PWM base period.
    pub const BASE_PERIOD: usize = 0xC;
    /// Window span in bytes.
    pub const SPAN: usize = 16;

    /// Duty value written to the red channel at power-on (fully on).
    pub const POWER_ON_DUTY: u32 = 0xFFFF;
    /// Base period written at power-on.
    pub const DEFAULT_BASE_PERIOD: u32 = 0x1000;

    /// Duty range the control programs scale external inputs into.
    pub mod duty {
        /// Fully off.
        pub const MIN: u32 = 0;
        /// Fully on, as used by the scaling loops.
        pub const MAX: u32 = 0x8000;
    }
}

/// Stop-button input.
///
/// A single latched register: the fabric sets it to 1 on a press and holds
/// it until software writes it back to 0.
pub mod stop_button {
    /// Latched button state.
    pub const STOP_BUTTON: usize = 0x0;
    /// Window span in bytes.
    pub const SPAN: usize = 16;

    /// Register value while no press is latched.
    pub const RELEASED: u32 = 0;
    /// Register value once a press has been latched.
    pub const PRESSED: u32 = 1;
}

/// WS2811 strip controller.
pub mod ws2811 {
    /// Color applied to every LED on the strip.
    pub const RGB_ALL: usize = 0x0;
    /// Color applied to the LED selected by [`STRIP_INDEX`].
    pub const RGB_SINGLE: usize = 0x4;
    /// Index of the LED addressed by [`RGB_SINGLE`].
    pub const STRIP_INDEX: usize = 0x8;
    /// Window span in bytes.
    pub const SPAN: usize = 12;

    /// Whole-strip color written at power-on.
    pub const POWER_ON_RGB_ALL: u32 = 0xFFFF;
    /// LEDs on the reference strip.
    pub const NUM_LEDS: u32 = 250;
}

/// ADC sample block (input-only collaborator).
///
/// Eight channels, one sample word each, read via the same block convention
/// as the peripherals above. Samples are raw converter counts.
pub mod adc {
    /// First channel; channels are contiguous words.
    pub const CH0: usize = 0x0;
    /// Channel count.
    pub const CHANNELS: usize = 8;
    /// Window span in bytes.
    pub const SPAN: usize = 32;

    /// Largest sample the converter produces.
    pub const MAX_SAMPLE: u32 = 3299;

    /// Byte offset of a channel's sample word.
    #[must_use]
    pub const fn channel_offset(channel: usize) -> usize {
        CH0 + channel * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_word_aligned_and_in_span() {
        assert_eq!(pwm_rgb::BASE_PERIOD % 4, 0);
        assert!(pwm_rgb::BASE_PERIOD < pwm_rgb::SPAN);
        assert!(stop_button::STOP_BUTTON < stop_button::SPAN);
        assert!(ws2811::STRIP_INDEX < ws2811::SPAN);
    }

    #[test]
    fn expected_layout() {
        assert_eq!(pwm_rgb::DUTY_RED, 0x0);
        assert_eq!(pwm_rgb::DUTY_GREEN, 0x4);
        assert_eq!(pwm_rgb::DUTY_BLUE, 0x8);
        assert_eq!(pwm_rgb::BASE_PERIOD, 0xC);
        assert_eq!(ws2811::SPAN, 12);
    }

    #[test]
    fn adc_channels_inside_span() {
        assert_eq!(adc::channel_offset(0), 0);
        assert_eq!(adc::channel_offset(2), 8);
        assert!(adc::channel_offset(adc::CHANNELS - 1) < adc::SPAN);
    }
}
