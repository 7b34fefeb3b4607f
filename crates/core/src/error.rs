//! Error types for mamba-ctl-core.

use crate::report::FrameField;
use thiserror::Error;

/// A frame could not be built as requested.
///
/// Only reachable through a catalog bug; every catalog operation builds
/// frames well inside the parameter window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// Declared parameter count exceeds the 80-byte parameter window.
    #[error("parameter count {count} exceeds {max}")]
    ParameterCount { count: u8, max: usize },

    /// Parameter bytes do not fit into the parameter window.
    #[error("{len} parameter bytes overflow the {max}-byte window")]
    ParameterOverflow { len: usize, max: usize },
}

/// The control channel did not move a whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Outbound set-feature-report transferred fewer (or more) than 90 bytes.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Inbound get-feature-report returned fewer (or more) than 90 bytes.
    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },
}

/// A reply frame does not answer the request that elicited it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("reply length {len}, expected {expected}")]
    LengthMismatch { len: usize, expected: usize },

    #[error("reply status marker 0x{marker:02X}, expected 0x02")]
    MarkerMismatch { marker: u8 },

    #[error("reply {field} is 0x{actual:02X}, expected 0x{expected:02X}")]
    FieldMismatch {
        field: FrameField,
        expected: u8,
        actual: u8,
    },
}

/// Malformed input at the attribute boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Attribute requires an exact number of raw bytes.
    #[error("{attribute} expects {expected} bytes, got {got}")]
    ByteCount {
        attribute: &'static str,
        expected: usize,
        got: usize,
    },

    /// No attribute with this name exists.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Colour string could not be parsed.
    #[error("invalid colour '{0}': expected RRGGBB hex")]
    Colour(String),
}

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Control-transfer primitive failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Input(#[from] InputError),

    /// Profile serialization/deserialization or file error.
    #[error("profile error: {0}")]
    Profile(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
