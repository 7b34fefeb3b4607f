//! Razer 90-byte report encoding and decoding.
//!
//! Every request and reply is a single fixed-size feature report:
//!
//! | Offset | Field            |
//! |--------|------------------|
//! | 0      | status marker    |
//! | 1      | transport class  |
//! | 2      | parameter count  |
//! | 3      | group            |
//! | 4      | command          |
//! | 5      | sub-command      |
//! | 6..86  | parameters       |
//! | 86, 87 | reserved         |
//! | 88     | checksum         |
//! | 89     | terminator       |
//!
//! The checksum is an XOR fold of bytes `[2, 88)`.

use crate::error::{ConstraintError, InputError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of every frame on the wire.
pub const REPORT_LEN: usize = 90;
/// Size of the parameter window.
pub const PARAMS_LEN: usize = 80;

pub const STATUS_OFFSET: usize = 0;
pub const TRANSPORT_OFFSET: usize = 1;
pub const PARAM_COUNT_OFFSET: usize = 2;
pub const GROUP_OFFSET: usize = 3;
pub const COMMAND_OFFSET: usize = 4;
pub const SUB_COMMAND_OFFSET: usize = 5;
pub const PARAMS_OFFSET: usize = 6;
pub const CHECKSUM_OFFSET: usize = 88;

/// Status marker on an outbound request.
pub const REQUEST_MARKER: u8 = 0x00;
/// Status marker the device sets on a valid reply.
pub const REPLY_MARKER: u8 = 0x02;
/// Transport class byte on an outbound request.
pub const REQUEST_TRANSPORT: u8 = 0xFF;

/// Functional subsystem selectors (byte 3).
pub mod groups {
    /// Device information (serial number).
    pub const INFO: u8 = 0x00;
    /// Lighting effects and charging effects.
    pub const EFFECTS: u8 = 0x03;
    /// Sensor DPI.
    pub const DPI: u8 = 0x04;
    /// Power management: battery, idle, wireless brightness.
    pub const POWER: u8 = 0x07;
}

/// Header field of a frame, used to report echo mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    Group,
    Command,
    SubCommand,
}

impl fmt::Display for FrameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Group => "group",
            Self::Command => "command",
            Self::SubCommand => "sub-command",
        };
        f.write_str(name)
    }
}

/// XOR fold of bytes `[2, 88)`.
///
/// Shorter buffers fold whatever part of the window they contain.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .take(CHECKSUM_OFFSET)
        .skip(PARAM_COUNT_OFFSET)
        .fold(0, |acc, b| acc ^ b)
}

/// A single 90-byte request or reply.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; REPORT_LEN],
}

impl Frame {
    /// Build a zero-filled request frame.
    ///
    /// The checksum byte is left at zero; [`Frame::finalize`] fills it in
    /// right before transmission.
    pub fn prepare(
        group: u8,
        command: u8,
        sub_command: u8,
        parameter_count: u8,
        params: &[u8],
    ) -> Result<Self, ConstraintError> {
        if parameter_count as usize > PARAMS_LEN {
            return Err(ConstraintError::ParameterCount {
                count: parameter_count,
                max: PARAMS_LEN,
            });
        }
        if params.len() > PARAMS_LEN {
            return Err(ConstraintError::ParameterOverflow {
                len: params.len(),
                max: PARAMS_LEN,
            });
        }

        let mut bytes = [0u8; REPORT_LEN];
        bytes[STATUS_OFFSET] = REQUEST_MARKER;
        bytes[TRANSPORT_OFFSET] = REQUEST_TRANSPORT;
        bytes[PARAM_COUNT_OFFSET] = parameter_count;
        bytes[GROUP_OFFSET] = group;
        bytes[COMMAND_OFFSET] = command;
        bytes[SUB_COMMAND_OFFSET] = sub_command;
        bytes[PARAMS_OFFSET..PARAMS_OFFSET + params.len()].copy_from_slice(params);
        Ok(Self { bytes })
    }

    /// Wrap a buffer received from the device.
    pub fn from_raw(bytes: [u8; REPORT_LEN]) -> Self {
        Self { bytes }
    }

    /// Write the checksum byte. Call once, immediately before sending.
    pub fn finalize(&mut self) {
        self.bytes[CHECKSUM_OFFSET] = checksum(&self.bytes);
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.bytes
    }

    pub fn status(&self) -> u8 {
        self.bytes[STATUS_OFFSET]
    }

    /// Byte 1. Informational only on replies.
    pub fn transport_class(&self) -> u8 {
        self.bytes[TRANSPORT_OFFSET]
    }

    pub fn parameter_count(&self) -> u8 {
        self.bytes[PARAM_COUNT_OFFSET]
    }

    pub fn group(&self) -> u8 {
        self.bytes[GROUP_OFFSET]
    }

    pub fn command(&self) -> u8 {
        self.bytes[COMMAND_OFFSET]
    }

    pub fn sub_command(&self) -> u8 {
        self.bytes[SUB_COMMAND_OFFSET]
    }

    /// The 80-byte parameter window.
    pub fn params(&self) -> &[u8] {
        &self.bytes[PARAMS_OFFSET..PARAMS_OFFSET + PARAMS_LEN]
    }

    /// Checksum byte as stored in the frame.
    pub fn stored_checksum(&self) -> u8 {
        self.bytes[CHECKSUM_OFFSET]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("status", &format_args!("0x{:02X}", self.status()))
            .field("transport", &format_args!("0x{:02X}", self.transport_class()))
            .field("count", &self.parameter_count())
            .field("group", &format_args!("0x{:02X}", self.group()))
            .field("command", &format_args!("0x{:02X}", self.command()))
            .field("sub_command", &format_args!("0x{:02X}", self.sub_command()))
            .field("params", &format_args!("{:02X?}", &self.params()[..8]))
            .field("checksum", &format_args!("0x{:02X}", self.stored_checksum()))
            .finish()
    }
}

/// Check that a reply answers the request and return its parameter window.
///
/// `sub_command` is `None` for commands where the device reuses byte 5 as data.
pub fn validate_reply(
    reply: &[u8],
    group: u8,
    command: u8,
    sub_command: Option<u8>,
) -> Result<&[u8], ValidationError> {
    if reply.len() != REPORT_LEN {
        return Err(ValidationError::LengthMismatch {
            len: reply.len(),
            expected: REPORT_LEN,
        });
    }
    if reply[STATUS_OFFSET] != REPLY_MARKER {
        return Err(ValidationError::MarkerMismatch {
            marker: reply[STATUS_OFFSET],
        });
    }

    let echoes = [
        (FrameField::Group, GROUP_OFFSET, Some(group)),
        (FrameField::Command, COMMAND_OFFSET, Some(command)),
        (FrameField::SubCommand, SUB_COMMAND_OFFSET, sub_command),
    ];
    for (field, offset, expected) in echoes {
        if let Some(expected) = expected {
            if reply[offset] != expected {
                return Err(ValidationError::FieldMismatch {
                    field,
                    expected,
                    actual: reply[offset],
                });
            }
        }
    }

    Ok(&reply[PARAMS_OFFSET..PARAMS_OFFSET + PARAMS_LEN])
}

/// An RGB colour, copied by value into parameter bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const RED: Rgb = Rgb::new(0xFF, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Decode three bytes at the start of `data`.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        match data {
            [r, g, b, ..] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = InputError;

    /// Parse `RRGGBB`, with or without a leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(InputError::Colour(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| InputError::Colour(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
