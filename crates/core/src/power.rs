//! Power management (group 0x07): battery, charging state, wireless
//! brightness, low-battery threshold, and idle timer.
//!
//! Several commands here reuse the sub-command byte as a data byte.

use crate::error::Result;
use crate::report::{groups, Frame};
use crate::safety;
use crate::transport::{query_command, send_command, Transport};
use tracing::debug;

const LOW_BATTERY_THRESHOLD: u8 = 0x01;
const WIRELESS_BRIGHTNESS: u8 = 0x02;
const IDLE_TIME: u8 = 0x03;
const BATTERY_LEVEL: u8 = 0x80;
const CHARGING_STATUS: u8 = 0x84;

/// Read the raw battery level (0-255).
pub fn read_battery_level(transport: &dyn Transport) -> Result<u8> {
    let priming = Frame::prepare(groups::POWER, BATTERY_LEVEL, 0x00, 0x02, &[])?;
    let reply = query_command(transport, "get_battery_level", priming, true)?;
    let level = reply.params()[0];
    debug!(level, "battery level");
    Ok(level)
}

/// Battery level 0-255, or -1 if the device did not answer properly.
pub fn get_battery_level(transport: &dyn Transport) -> i32 {
    read_battery_level(transport).map_or(-1, i32::from)
}

/// Read the raw charging flag (0 when not charging, 1 when charging).
///
/// Firmware may report other values; they are passed through unchanged.
pub fn read_charging(transport: &dyn Transport) -> Result<u8> {
    let priming = Frame::prepare(groups::POWER, CHARGING_STATUS, 0x00, 0x02, &[])?;
    let reply = query_command(transport, "is_charging", priming, true)?;
    let flag = reply.params()[0];
    debug!(flag, "charging flag");
    Ok(flag)
}

/// Raw charging flag, or -1 on failure.
pub fn is_charging(transport: &dyn Transport) -> i32 {
    read_charging(transport).map_or(-1, i32::from)
}

/// LED brightness while running on battery.
pub fn set_wireless_brightness(transport: &dyn Transport, brightness: u8) -> Result<()> {
    let frame = Frame::prepare(groups::POWER, WIRELESS_BRIGHTNESS, brightness, 0x01, &[])?;
    send_command(transport, "set_wireless_brightness", frame)
}

/// Battery level below which the device blinks. Capped at 0x3F (25%).
pub fn set_low_battery_threshold(transport: &dyn Transport, threshold: u8) -> Result<()> {
    let threshold = safety::clamp_low_battery_threshold(threshold);
    let frame = Frame::prepare(groups::POWER, LOW_BATTERY_THRESHOLD, threshold, 0x01, &[])?;
    send_command(transport, "set_low_battery_threshold", frame)
}

/// Seconds of inactivity before the device sleeps, at most 900.
///
/// Encoded big-endian: high byte in the sub-command, low byte in params[0].
pub fn set_idle_time(transport: &dyn Transport, seconds: u16) -> Result<()> {
    let [hi, lo] = safety::clamp_idle_time(seconds).to_be_bytes();
    let frame = Frame::prepare(groups::POWER, IDLE_TIME, hi, 0x02, &[lo])?;
    send_command(transport, "set_idle_time", frame)
}
