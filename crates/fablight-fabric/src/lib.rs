//! Fabric model for the fablight soft peripherals.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the FPGA fabric design: register offsets, window spans,
//! devicetree compatible strings, bridge addresses, and the power-on /
//! quiesce value tables each peripheral carries.
//!
//! Everything here mirrors the Qsys reference design for the Cyclone V
//! lightweight HPS-to-FPGA bridge; the driver crate consumes these facts but
//! never redefines them.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`bridge`] | Lightweight bridge base/span and reference Qsys offsets |
//! | [`compat`] | Peripheral kinds, compatible strings, device names |
//! | [`regs`] | Per-peripheral register offsets, spans, and value ranges |
//! | [`map`] | Register-map descriptors consumed by the driver |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod compat;
pub mod map;
pub mod regs;

pub use compat::PeripheralKind;
pub use map::{MapDefect, RegInit, Register, RegisterMap};
