//! Lighting and charging effects (group 0x03).
//!
//! Effect commands:
//!   - 0x0A: set effect, sub-command selects the mode (wave, reactive, breath, spectrum, static)
//!   - 0x10: charging effect, sub-command carries the charge type
//!   - 0x01: charging colour, params = [0x03, r, g, b]

use crate::error::Result;
use crate::report::{groups, Frame, Rgb};
use crate::safety;
use crate::transport::{send_command, Transport};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SET_EFFECT: u8 = 0x0A;
const SET_CHARGING_EFFECT: u8 = 0x10;
const SET_CHARGING_COLOUR: u8 = 0x01;

/// Effect ids carried in the sub-command byte of [`SET_EFFECT`].
mod effect_ids {
    pub const WAVE: u8 = 0x01;
    pub const REACTIVE: u8 = 0x02;
    pub const BREATH: u8 = 0x03;
    pub const SPECTRUM: u8 = 0x04;
    pub const STATIC: u8 = 0x06;
}

/// Leading charging-colour parameter; meaning unknown, always 0x03.
const CHARGING_COLOUR_MARKER: u8 = 0x03;

/// Direction of the wave effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WaveDirection {
    Up = 1,
    Down = 2,
}

impl WaveDirection {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            2 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Breathing effect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Breath {
    Single { colour: Rgb },
    Dual { first: Rgb, second: Rgb },
    Random,
}

impl Breath {
    /// Breathing type byte: 1 single, 2 dual, 3 random.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Single { .. } => 0x01,
            Self::Dual { .. } => 0x02,
            Self::Random => 0x03,
        }
    }

    pub fn colours(&self) -> (Rgb, Rgb) {
        match *self {
            Self::Single { colour } => (colour, Rgb::BLACK),
            Self::Dual { first, second } => (first, second),
            Self::Random => (Rgb::BLACK, Rgb::BLACK),
        }
    }
}

/// Any lighting effect the device can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Effect {
    Static { colour: Rgb },
    Wave { direction: WaveDirection },
    Spectrum,
    Reactive { speed: u8, colour: Rgb },
    Breath { breath: Breath },
}

/// Apply an effect through the matching catalog operation.
pub fn set_effect(transport: &dyn Transport, effect: &Effect) -> Result<()> {
    match *effect {
        Effect::Static { colour } => set_static_mode(transport, colour),
        Effect::Wave { direction } => set_wave_mode(transport, direction),
        Effect::Spectrum => set_spectrum_mode(transport),
        Effect::Reactive { speed, colour } => set_reactive_mode(transport, speed, colour),
        Effect::Breath { breath } => {
            let (first, second) = breath.colours();
            set_breath_mode(transport, breath.type_byte(), first, second)
        }
    }
}

pub fn set_wave_mode(transport: &dyn Transport, direction: WaveDirection) -> Result<()> {
    let frame = Frame::prepare(
        groups::EFFECTS,
        SET_EFFECT,
        effect_ids::WAVE,
        0x02,
        &[direction as u8],
    )?;
    send_command(transport, "set_wave_mode", frame)
}

pub fn set_static_mode(transport: &dyn Transport, colour: Rgb) -> Result<()> {
    let frame = Frame::prepare(
        groups::EFFECTS,
        SET_EFFECT,
        effect_ids::STATIC,
        0x04,
        &colour.to_bytes(),
    )?;
    send_command(transport, "set_static_mode", frame)
}

pub fn set_spectrum_mode(transport: &dyn Transport) -> Result<()> {
    let frame = Frame::prepare(groups::EFFECTS, SET_EFFECT, effect_ids::SPECTRUM, 0x02, &[])?;
    send_command(transport, "set_spectrum_mode", frame)
}

/// Reactive effect. `speed` 1 = short, 2 = medium, 3 = long.
pub fn set_reactive_mode(transport: &dyn Transport, speed: u8, colour: Rgb) -> Result<()> {
    let speed = safety::clamp_reactive_speed(speed);
    let [r, g, b] = colour.to_bytes();
    let frame = Frame::prepare(
        groups::EFFECTS,
        SET_EFFECT,
        effect_ids::REACTIVE,
        0x05,
        &[speed, r, g, b],
    )?;
    send_command(transport, "set_reactive_mode", frame)
}

/// Breathing effect.
///
/// Type 1 uses `first`, type 2 uses both colours, any other type is random
/// and both colours are left zero.
pub fn set_breath_mode(
    transport: &dyn Transport,
    breath_type: u8,
    first: Rgb,
    second: Rgb,
) -> Result<()> {
    let mut params = [0u8; 7];
    params[0] = breath_type;
    if breath_type == 0x01 || breath_type == 0x02 {
        params[1..4].copy_from_slice(&first.to_bytes());
    }
    if breath_type == 0x02 {
        params[4..7].copy_from_slice(&second.to_bytes());
    }

    let frame = Frame::prepare(groups::EFFECTS, SET_EFFECT, effect_ids::BREATH, 0x08, &params)?;
    send_command(transport, "set_breath_mode", frame)
}

/// Charging effect: 0 keeps the current effect while charging, 1 shows the
/// charging colour.
pub fn set_charging_effect(transport: &dyn Transport, charge_type: u8) -> Result<()> {
    let charge_type = safety::normalize_charge_type(charge_type);
    let frame = Frame::prepare(groups::EFFECTS, SET_CHARGING_EFFECT, charge_type, 0x01, &[])?;
    send_command(transport, "set_charging_effect", frame)
}

/// Switch to the charging-colour effect, then set the colour.
///
/// The two exchanges are independent. If the colour write fails the device
/// stays in charging-colour mode with its previous colour.
pub fn set_charging_colour(transport: &dyn Transport, colour: Rgb) -> Result<()> {
    if let Err(e) = set_charging_effect(transport, 0x01) {
        debug!(error = %e, "charging effect switch failed, sending colour anyway");
    }

    let [r, g, b] = colour.to_bytes();
    let frame = Frame::prepare(
        groups::EFFECTS,
        SET_CHARGING_COLOUR,
        0x00,
        0x05,
        &[CHARGING_COLOUR_MARKER, r, g, b],
    )?;
    send_command(transport, "set_charging_colour", frame)
}
