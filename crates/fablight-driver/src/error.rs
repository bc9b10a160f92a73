//! Error types for fabric peripheral operations

use thiserror::Error;

/// Result type alias for fabric operations
pub type Result<T> = std::result::Result<T, FablightError>;

/// Errors that can occur during fabric peripheral operations
#[derive(Debug, Error)]
pub enum FablightError {
    /// Access offset at or beyond the window span
    #[error("Offset {offset:#x} out of range (window span {span:#x})")]
    OutOfRange {
        /// Requested byte offset
        offset: usize,
        /// Window span in bytes
        span: usize,
    },

    /// Access offset not on a register boundary
    #[error("Offset {offset:#x} is not 4-byte aligned")]
    Unaligned {
        /// Requested byte offset
        offset: usize,
    },

    /// Register name not present in the peripheral's map
    #[error("Unknown register: {name}")]
    UnknownRegister {
        /// Requested name
        name: String,
    },

    /// Textual register value could not be parsed
    #[error("Cannot parse {text:?} as an unsigned register value")]
    Parse {
        /// Rejected input
        text: String,
    },

    /// Block transfer supplied fewer bytes than one register width
    #[error("Short transfer: need {needed} bytes, got {got}")]
    ShortTransfer {
        /// Bytes required for one register
        needed: usize,
        /// Bytes the caller supplied
        got: usize,
    },

    /// Register window could not be mapped
    #[error("Window mapping failed: {reason}")]
    MapFailure {
        /// Reason for failure
        reason: String,
    },

    /// Surface could not be published
    #[error("Surface registration failed: {reason}")]
    RegistrationFailure {
        /// Reason for failure
        reason: String,
    },

    /// Seek would land before the start of the window
    #[error("Invalid offset: {offset}")]
    InvalidOffset {
        /// Computed target offset
        offset: i64,
    },

    /// Access against an instance that has been removed
    #[error("Peripheral instance '{name}' has been removed")]
    InstanceRemoved {
        /// Device name of the removed instance
        name: String,
    },

    /// No fabric peripherals detected on the system
    #[error("No fabric peripherals detected")]
    NoDevicesFound,

    /// Device index out of range
    #[error("Device index {index} out of range (have {count} devices)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of available devices
        count: usize,
    },

    /// I/O error while probing the system
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl FablightError {
    /// Create an out-of-range access error
    pub const fn out_of_range(offset: usize, span: usize) -> Self {
        Self::OutOfRange { offset, span }
    }

    /// Create an unaligned access error
    pub const fn unaligned(offset: usize) -> Self {
        Self::Unaligned { offset }
    }

    /// Create an unknown register error
    pub fn unknown_register(name: impl Into<String>) -> Self {
        Self::UnknownRegister { name: name.into() }
    }

    /// Create a parse error
    pub fn parse(text: impl Into<String>) -> Self {
        Self::Parse { text: text.into() }
    }

    /// Create a short transfer error
    pub const fn short_transfer(needed: usize, got: usize) -> Self {
        Self::ShortTransfer { needed, got }
    }

    /// Create a window mapping error
    pub fn map_failure(reason: impl Into<String>) -> Self {
        Self::MapFailure {
            reason: reason.into(),
        }
    }

    /// Create a surface registration error
    pub fn registration_failure(reason: impl Into<String>) -> Self {
        Self::RegistrationFailure {
            reason: reason.into(),
        }
    }

    /// Create an invalid offset error
    pub const fn invalid_offset(offset: i64) -> Self {
        Self::InvalidOffset { offset }
    }

    /// Create an instance-removed error
    pub fn instance_removed(name: impl Into<String>) -> Self {
        Self::InstanceRemoved { name: name.into() }
    }
}
