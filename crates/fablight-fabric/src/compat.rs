//! Devicetree identifiers for the fabric peripherals.
//!
//! Each peripheral is matched by exactly one compatible string and publishes
//! one block device under its device name.

/// Compatible strings as they appear in the devicetree.
pub mod compatible {
    /// RGB PWM controller.
    pub const PWM_RGB: &str = "jensen,pwm_rgb";
    /// Stop-button input.
    pub const STOP_BUTTON: &str = "jensen,stop_button";
    /// WS2811 strip controller.
    pub const WS2811: &str = "jensen,ws2811";
    /// ADC sample block (input-only collaborator).
    pub const ADC: &str = "jensen,adc";
}

/// All compatible strings this crate knows how to drive.
pub const ALL_COMPATIBLES: &[&str] = &[
    compatible::PWM_RGB,
    compatible::STOP_BUTTON,
    compatible::WS2811,
    compatible::ADC,
];

/// Peripheral kind discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralKind {
    /// RGB PWM controller — three duty registers plus a shared base period.
    PwmRgb,
    /// Stop-button input — one latched button register.
    StopButton,
    /// WS2811 strip controller — whole-strip and single-LED color plus index.
    Ws2811,
    /// ADC sample block — read-only channel samples.
    Adc,
}

impl PeripheralKind {
    /// Identify the kind from a devicetree compatible string.
    #[must_use]
    pub fn from_compatible(compat: &str) -> Option<Self> {
        match compat {
            compatible::PWM_RGB => Some(Self::PwmRgb),
            compatible::STOP_BUTTON => Some(Self::StopButton),
            compatible::WS2811 => Some(Self::Ws2811),
            compatible::ADC => Some(Self::Adc),
            _ => None,
        }
    }

    /// The compatible string this kind matches.
    #[must_use]
    pub const fn compatible(self) -> &'static str {
        match self {
            Self::PwmRgb => compatible::PWM_RGB,
            Self::StopButton => compatible::STOP_BUTTON,
            Self::Ws2811 => compatible::WS2811,
            Self::Adc => compatible::ADC,
        }
    }

    /// Device name the peripheral publishes its surfaces under.
    #[must_use]
    pub const fn device_name(self) -> &'static str {
        match self {
            Self::PwmRgb => "pwm_rgb",
            Self::StopButton => "stop_button",
            Self::Ws2811 => "ws2811",
            Self::Adc => "adc",
        }
    }

    /// Window span in bytes.
    #[must_use]
    pub const fn span(self) -> usize {
        match self {
            Self::PwmRgb => crate::regs::pwm_rgb::SPAN,
            Self::StopButton => crate::regs::stop_button::SPAN,
            Self::Ws2811 => crate::regs::ws2811::SPAN,
            Self::Adc => crate::regs::adc::SPAN,
        }
    }
}
