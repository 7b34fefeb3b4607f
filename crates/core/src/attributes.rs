//! Named read/write attributes over a per-device session.
//!
//! Each attribute accepts a write of a specific shape and maps it onto one
//! catalog operation. Malformed writes either fall back to a default or are
//! rejected here, before any frame is built. Transfer failures are logged by
//! the catalog and never surface from a write.

use crate::device;
use crate::dpi;
use crate::effects::{self, WaveDirection};
use crate::error::InputError;
use crate::power;
use crate::report::Rgb;
use crate::safety::DPI_DEFAULT;
use crate::transport::{ControlTransfer, Transport, TransportClient};
use tracing::{debug, warn};

/// Every attribute a Mamba session exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    ModeStatic,
    ModeWave,
    ModeSpectrum,
    ModeReactive,
    ModeBreath,
    GetBattery,
    GetSerial,
    IsCharging,
    SetWirelessBrightness,
    SetLowBatteryThreshold,
    SetIdleTime,
    SetMouseDpi,
    SetChargingEffect,
    SetChargingColour,
}

impl Attribute {
    pub const ALL: &'static [Attribute] = &[
        Attribute::ModeStatic,
        Attribute::ModeWave,
        Attribute::ModeSpectrum,
        Attribute::ModeReactive,
        Attribute::ModeBreath,
        Attribute::GetBattery,
        Attribute::GetSerial,
        Attribute::IsCharging,
        Attribute::SetWirelessBrightness,
        Attribute::SetLowBatteryThreshold,
        Attribute::SetIdleTime,
        Attribute::SetMouseDpi,
        Attribute::SetChargingEffect,
        Attribute::SetChargingColour,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ModeStatic => "mode_static",
            Self::ModeWave => "mode_wave",
            Self::ModeSpectrum => "mode_spectrum",
            Self::ModeReactive => "mode_reactive",
            Self::ModeBreath => "mode_breath",
            Self::GetBattery => "get_battery",
            Self::GetSerial => "get_serial",
            Self::IsCharging => "is_charging",
            Self::SetWirelessBrightness => "set_wireless_brightness",
            Self::SetLowBatteryThreshold => "set_low_battery_threshold",
            Self::SetIdleTime => "set_idle_time",
            Self::SetMouseDpi => "set_mouse_dpi",
            Self::SetChargingEffect => "set_charging_effect",
            Self::SetChargingColour => "set_charging_colour",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, InputError> {
        Self::ALL
            .iter()
            .copied()
            .find(|attr| attr.name() == name)
            .ok_or_else(|| InputError::UnknownAttribute(name.to_string()))
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse an unsigned decimal prefix the way `strtoul(buf, NULL, 10)` does.
///
/// Leading whitespace and an optional `+` are skipped; parsing stops at the
/// first non-digit; no digits yields 0. Overflow wraps.
pub fn parse_decimal(buf: &[u8]) -> u64 {
    let start = buf
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buf.len());
    let digits = match buf[start..].first() {
        Some(b'+') => &buf[start + 1..],
        _ => &buf[start..],
    };
    digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| {
            acc.wrapping_mul(10).wrapping_add(u64::from(b - b'0'))
        })
}

fn exact(attribute: Attribute, buf: &[u8], expected: usize) -> Result<(), InputError> {
    if buf.len() == expected {
        Ok(())
    } else {
        warn!(
            attribute = attribute.name(),
            expected,
            got = buf.len(),
            "wrong number of bytes for attribute"
        );
        Err(InputError::ByteCount {
            attribute: attribute.name(),
            expected,
            got: buf.len(),
        })
    }
}

fn be_u16(hi: u8, lo: u8) -> u16 {
    u16::from_be_bytes([hi, lo])
}

/// One attached device.
///
/// Created when the device is discovered and dropped when it goes away;
/// nothing outlives it.
pub struct MouseSession<C> {
    client: TransportClient<C>,
}

impl<C: ControlTransfer> MouseSession<C> {
    pub fn new(control: C) -> Self {
        Self {
            client: TransportClient::new(control),
        }
    }

    /// Frame-level transport, for calling catalog operations directly.
    pub fn transport(&self) -> &dyn Transport {
        &self.client
    }

    /// Apply a write to an attribute.
    ///
    /// Returns an error only for writes rejected at the boundary.
    pub fn write_attribute(&self, attribute: Attribute, buf: &[u8]) -> Result<(), InputError> {
        debug!(attribute = attribute.name(), len = buf.len(), "attribute write");
        let t = self.transport();

        // Catalog failures are already logged.
        let _ = match attribute {
            Attribute::ModeStatic => {
                exact(attribute, buf, 3)?;
                effects::set_static_mode(t, Rgb::new(buf[0], buf[1], buf[2]))
            }
            Attribute::ModeWave => {
                let value = parse_decimal(buf);
                match u8::try_from(value).ok().and_then(WaveDirection::from_u8) {
                    Some(direction) => effects::set_wave_mode(t, direction),
                    None => {
                        debug!(value, "wave direction must be 1 or 2, ignoring");
                        Ok(())
                    }
                }
            }
            Attribute::ModeSpectrum => effects::set_spectrum_mode(t),
            Attribute::ModeReactive => {
                exact(attribute, buf, 4)?;
                effects::set_reactive_mode(t, buf[0], Rgb::new(buf[1], buf[2], buf[3]))
            }
            Attribute::ModeBreath => match buf.len() {
                3 => effects::set_breath_mode(
                    t,
                    0x01,
                    Rgb::new(buf[0], buf[1], buf[2]),
                    Rgb::BLACK,
                ),
                6 => effects::set_breath_mode(
                    t,
                    0x02,
                    Rgb::new(buf[0], buf[1], buf[2]),
                    Rgb::new(buf[3], buf[4], buf[5]),
                ),
                _ => effects::set_breath_mode(t, 0x03, Rgb::BLACK, Rgb::BLACK),
            },
            Attribute::SetWirelessBrightness => {
                power::set_wireless_brightness(t, parse_decimal(buf) as u8)
            }
            Attribute::SetLowBatteryThreshold => {
                power::set_low_battery_threshold(t, parse_decimal(buf) as u8)
            }
            Attribute::SetIdleTime => power::set_idle_time(t, parse_decimal(buf) as u16),
            Attribute::SetMouseDpi => match *buf {
                [hi, lo] => dpi::set_mouse_dpi(t, be_u16(hi, lo), be_u16(hi, lo)),
                [x_hi, x_lo, y_hi, y_lo] => {
                    dpi::set_mouse_dpi(t, be_u16(x_hi, x_lo), be_u16(y_hi, y_lo))
                }
                _ => {
                    warn!(len = buf.len(), "unknown DPI setting, using 1500x1500");
                    dpi::set_mouse_dpi(t, DPI_DEFAULT, DPI_DEFAULT)
                }
            },
            Attribute::SetChargingEffect => match *buf {
                [charge_type] => effects::set_charging_effect(t, charge_type),
                _ => {
                    warn!(
                        len = buf.len(),
                        "wrong number of bytes for charging effect, using 1"
                    );
                    effects::set_charging_effect(t, 0x01)
                }
            },
            Attribute::SetChargingColour => {
                let colour = match Rgb::from_slice(buf) {
                    Some(colour) if buf.len() == 3 => colour,
                    _ => {
                        warn!(
                            len = buf.len(),
                            "wrong number of bytes for charging colour, using red"
                        );
                        Rgb::RED
                    }
                };
                effects::set_charging_colour(t, colour)
            }
            Attribute::GetBattery | Attribute::GetSerial | Attribute::IsCharging => Ok(()),
        };
        Ok(())
    }

    /// Read an attribute as newline-terminated text.
    pub fn read_attribute(&self, attribute: Attribute) -> String {
        let t = self.transport();
        match attribute {
            Attribute::GetBattery => format!("{}\n", power::get_battery_level(t)),
            Attribute::IsCharging => format!("{}\n", power::is_charging(t)),
            Attribute::GetSerial => format!("{}\n", device::get_serial(t)),
            _ => "0\n".to_string(),
        }
    }

    /// Tear the session down and return the control primitive.
    pub fn into_control(self) -> C {
        self.client.into_inner()
    }
}
