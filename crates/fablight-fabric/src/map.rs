//! Register-map descriptors.
//!
//! One [`RegisterMap`] fully describes a peripheral's window: its device
//! name, compatible string, span, named registers, and the value tables the
//! driver writes at power-on and removal. The driver is generic over the
//! descriptor; the three peripherals (plus the ADC collaborator) differ only
//! in the constants below.

use core::fmt;

use crate::compat::PeripheralKind;
use crate::regs;

/// One named register inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    /// Stable attribute name.
    pub name: &'static str,
    /// Byte offset within the window.
    pub offset: usize,
}

/// One register write performed during a lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegInit {
    /// Target register, by name.
    pub name: &'static str,
    /// Value to store.
    pub value: u32,
}

/// Complete description of one peripheral's register window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Device name the surfaces are published under.
    pub name: &'static str,
    /// Devicetree compatible string.
    pub compatible: &'static str,
    /// Window span in bytes.
    pub span: usize,
    /// Named registers, each on a 4-byte boundary inside the span.
    pub registers: &'static [Register],
    /// Values written when the instance goes active.
    pub power_on: &'static [RegInit],
    /// Values written when the instance is removed.
    pub quiesce: &'static [RegInit],
}

impl RegisterMap {
    /// Byte offset of a named register.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.registers
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.offset)
    }

    /// Names of every register in window order.
    pub fn register_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registers.iter().map(|r| r.name)
    }

    /// Number of 32-bit words the window holds.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.span / 4
    }

    /// Structural check: span is a word multiple, every offset is aligned
    /// and inside the span, names and offsets are unique, and every
    /// power-on/quiesce entry names a real register.
    pub fn validate(&self) -> Result<(), MapDefect> {
        if self.span % 4 != 0 {
            return Err(MapDefect::SpanNotWordMultiple { span: self.span });
        }
        for (i, reg) in self.registers.iter().enumerate() {
            if reg.offset % 4 != 0 {
                return Err(MapDefect::OffsetUnaligned {
                    name: reg.name,
                    offset: reg.offset,
                });
            }
            if reg.offset >= self.span {
                return Err(MapDefect::OffsetOutOfSpan {
                    name: reg.name,
                    offset: reg.offset,
                });
            }
            for other in &self.registers[i + 1..] {
                if other.name == reg.name {
                    return Err(MapDefect::DuplicateName { name: reg.name });
                }
                if other.offset == reg.offset {
                    return Err(MapDefect::DuplicateOffset { offset: reg.offset });
                }
            }
        }
        for init in self.power_on.iter().chain(self.quiesce) {
            if self.offset_of(init.name).is_none() {
                return Err(MapDefect::UnknownInitName { name: init.name });
            }
        }
        Ok(())
    }
}

/// Structural defect found by [`RegisterMap::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapDefect {
    /// Span is not a multiple of the 4-byte register width.
    SpanNotWordMultiple {
        /// Offending span.
        span: usize,
    },
    /// A register offset is not 4-byte aligned.
    OffsetUnaligned {
        /// Register name.
        name: &'static str,
        /// Offending offset.
        offset: usize,
    },
    /// A register offset falls outside the window span.
    OffsetOutOfSpan {
        /// Register name.
        name: &'static str,
        /// Offending offset.
        offset: usize,
    },
    /// Two registers share a name.
    DuplicateName {
        /// The duplicated name.
        name: &'static str,
    },
    /// Two registers share an offset.
    DuplicateOffset {
        /// The duplicated offset.
        offset: usize,
    },
    /// A power-on or quiesce entry names a register the map lacks.
    UnknownInitName {
        /// The unresolved name.
        name: &'static str,
    },
}

impl fmt::Display for MapDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpanNotWordMultiple { span } => {
                write!(f, "span {span} is not a multiple of 4")
            }
            Self::OffsetUnaligned { name, offset } => {
                write!(f, "register '{name}' offset {offset:#x} is not 4-byte aligned")
            }
            Self::OffsetOutOfSpan { name, offset } => {
                write!(f, "register '{name}' offset {offset:#x} falls outside the span")
            }
            Self::DuplicateName { name } => write!(f, "register name '{name}' is duplicated"),
            Self::DuplicateOffset { offset } => {
                write!(f, "register offset {offset:#x} is duplicated")
            }
            Self::UnknownInitName { name } => {
                write!(f, "init table names unknown register '{name}'")
            }
        }
    }
}

impl std::error::Error for MapDefect {}

/// RGB PWM controller window.
pub const PWM_RGB: RegisterMap = RegisterMap {
    name: PeripheralKind::PwmRgb.device_name(),
    compatible: PeripheralKind::PwmRgb.compatible(),
    span: regs::pwm_rgb::SPAN,
    registers: &[
        Register { name: "duty_red", offset: regs::pwm_rgb::DUTY_RED },
        Register { name: "duty_green", offset: regs::pwm_rgb::DUTY_GREEN },
        Register { name: "duty_blue", offset: regs::pwm_rgb::DUTY_BLUE },
        Register { name: "base_period", offset: regs::pwm_rgb::BASE_PERIOD },
    ],
    power_on: &[
        RegInit { name: "duty_red", value: regs::pwm_rgb::POWER_ON_DUTY },
        RegInit { name: "duty_green", value: 0 },
        RegInit { name: "duty_blue", value: 0 },
        RegInit { name: "base_period", value: regs::pwm_rgb::DEFAULT_BASE_PERIOD },
    ],
    // The base period keeps its value across removal.
    quiesce: &[
        RegInit { name: "duty_red", value: 0 },
        RegInit { name: "duty_green", value: 0 },
        RegInit { name: "duty_blue", value: 0 },
    ],
};

/// Stop-button input window.
pub const STOP_BUTTON: RegisterMap = RegisterMap {
    name: PeripheralKind::StopButton.device_name(),
    compatible: PeripheralKind::StopButton.compatible(),
    span: regs::stop_button::SPAN,
    registers: &[Register { name: "stop_button", offset: regs::stop_button::STOP_BUTTON }],
    power_on: &[RegInit { name: "stop_button", value: regs::stop_button::RELEASED }],
    quiesce: &[RegInit { name: "stop_button", value: regs::stop_button::RELEASED }],
};

/// WS2811 strip controller window.
pub const WS2811: RegisterMap = RegisterMap {
    name: PeripheralKind::Ws2811.device_name(),
    compatible: PeripheralKind::Ws2811.compatible(),
    span: regs::ws2811::SPAN,
    registers: &[
        Register { name: "rgb_all", offset: regs::ws2811::RGB_ALL },
        Register { name: "rgb_single", offset: regs::ws2811::RGB_SINGLE },
        Register { name: "strip_index", offset: regs::ws2811::STRIP_INDEX },
    ],
    power_on: &[
        RegInit { name: "rgb_all", value: regs::ws2811::POWER_ON_RGB_ALL },
        RegInit { name: "rgb_single", value: 0 },
        RegInit { name: "strip_index", value: 0 },
    ],
    quiesce: &[
        RegInit { name: "rgb_all", value: 0 },
        RegInit { name: "rgb_single", value: 0 },
        RegInit { name: "strip_index", value: 0 },
    ],
};

/// ADC sample block. Input-only, so both init tables are empty.
pub const ADC: RegisterMap = RegisterMap {
    name: PeripheralKind::Adc.device_name(),
    compatible: PeripheralKind::Adc.compatible(),
    span: regs::adc::SPAN,
    registers: &[
        Register { name: "ch0", offset: regs::adc::channel_offset(0) },
        Register { name: "ch1", offset: regs::adc::channel_offset(1) },
        Register { name: "ch2", offset: regs::adc::channel_offset(2) },
        Register { name: "ch3", offset: regs::adc::channel_offset(3) },
        Register { name: "ch4", offset: regs::adc::channel_offset(4) },
        Register { name: "ch5", offset: regs::adc::channel_offset(5) },
        Register { name: "ch6", offset: regs::adc::channel_offset(6) },
        Register { name: "ch7", offset: regs::adc::channel_offset(7) },
    ],
    power_on: &[],
    quiesce: &[],
};

/// Every map this crate ships.
pub const ALL: [&RegisterMap; 4] = [&PWM_RGB, &STOP_BUTTON, &WS2811, &ADC];

/// Map matching a devicetree compatible string.
#[must_use]
pub fn for_compatible(compat: &str) -> Option<&'static RegisterMap> {
    ALL.into_iter().find(|m| m.compatible == compat)
}

/// Map matching a device name.
#[must_use]
pub fn for_name(name: &str) -> Option<&'static RegisterMap> {
    ALL.into_iter().find(|m| m.name == name)
}
