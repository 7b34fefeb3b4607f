//! Input clamping: coerces every write parameter into the range the
//! firmware is known to accept before a frame is built.
//!
//! Out-of-range input is never an error. The substitute value is logged and
//! used for the rest of the operation.
//!
//! # Razer Mamba Bounds
//!
//! ## Reactive speed
//! - **Range**: 1 (short) – 3 (long)
//! - **Default**: 3 for anything else
//!
//! ## Low battery threshold
//! - **Range**: 0x00 – 0x3F (0x3F = 25%, 0x26 = 15%, 0x0C = 5%)
//! - Values above 25% are untested on hardware and capped.
//!
//! ## Idle time
//! - **Range**: 0 – 900 seconds (15 minutes)
//!
//! ## DPI
//! - **Range**: 0 – 16,000 per axis
//! - **Default**: 1500 × 1500 when the attribute write is malformed
//!
//! ## Charging effect
//! - **Values**: 0 (charge with current effect), 1 (charge with charging colour)
//! - **Default**: 1 for anything else

use tracing::warn;

pub const REACTIVE_SPEED_MIN: u8 = 1;
pub const REACTIVE_SPEED_MAX: u8 = 3;
pub const REACTIVE_SPEED_DEFAULT: u8 = 3;

/// 25% battery.
pub const LOW_BATTERY_THRESHOLD_MAX: u8 = 0x3F;

/// Fifteen minutes, in seconds.
pub const IDLE_TIME_MAX: u16 = 900;

pub const DPI_MAX: u16 = 16000;
pub const DPI_DEFAULT: u16 = 1500;

pub const CHARGE_TYPE_DEFAULT: u8 = 0x01;

pub fn clamp_reactive_speed(speed: u8) -> u8 {
    if (REACTIVE_SPEED_MIN..=REACTIVE_SPEED_MAX).contains(&speed) {
        return speed;
    }
    warn!(
        speed,
        "reactive speed must be within 1-3, defaulting to long"
    );
    REACTIVE_SPEED_DEFAULT
}

pub fn clamp_low_battery_threshold(threshold: u8) -> u8 {
    if threshold <= LOW_BATTERY_THRESHOLD_MAX {
        return threshold;
    }
    warn!(
        threshold = format_args!("0x{:02X}", threshold),
        "low battery threshold over 25% is untested, capping to 25%"
    );
    LOW_BATTERY_THRESHOLD_MAX
}

pub fn clamp_idle_time(seconds: u16) -> u16 {
    if seconds <= IDLE_TIME_MAX {
        return seconds;
    }
    warn!(seconds, "idle time over 15 minutes, setting to 15");
    IDLE_TIME_MAX
}

pub fn clamp_dpi(axis: &'static str, dpi: u16) -> u16 {
    if dpi <= DPI_MAX {
        return dpi;
    }
    warn!(axis, dpi, "DPI above 16000, setting to 16000");
    DPI_MAX
}

pub fn normalize_charge_type(charge_type: u8) -> u8 {
    if charge_type <= 1 {
        return charge_type;
    }
    warn!(charge_type, "charge type must be 0 or 1, setting to 1");
    CHARGE_TYPE_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactive_speed_in_range_is_kept() {
        for speed in 1..=3 {
            assert_eq!(clamp_reactive_speed(speed), speed);
        }
    }

    #[test]
    fn reactive_speed_out_of_range_defaults_to_long() {
        assert_eq!(clamp_reactive_speed(0), 3);
        assert_eq!(clamp_reactive_speed(4), 3);
        assert_eq!(clamp_reactive_speed(10), 3);
        assert_eq!(clamp_reactive_speed(u8::MAX), 3);
    }

    #[test]
    fn low_battery_threshold_capped_at_quarter() {
        assert_eq!(clamp_low_battery_threshold(0x0C), 0x0C);
        assert_eq!(clamp_low_battery_threshold(0x3F), 0x3F);
        assert_eq!(clamp_low_battery_threshold(0x40), 0x3F);
        assert_eq!(clamp_low_battery_threshold(0x50), 0x3F);
    }

    #[test]
    fn idle_time_capped_at_fifteen_minutes() {
        assert_eq!(clamp_idle_time(0), 0);
        assert_eq!(clamp_idle_time(900), 900);
        assert_eq!(clamp_idle_time(901), 900);
        assert_eq!(clamp_idle_time(u16::MAX), 900);
    }

    #[test]
    fn dpi_capped_per_axis() {
        assert_eq!(clamp_dpi("x", 800), 800);
        assert_eq!(clamp_dpi("x", 16000), 16000);
        assert_eq!(clamp_dpi("y", 20000), 16000);
    }

    #[test]
    fn charge_type_outside_zero_one_defaults() {
        assert_eq!(normalize_charge_type(0), 0);
        assert_eq!(normalize_charge_type(1), 1);
        assert_eq!(normalize_charge_type(2), 1);
        assert_eq!(normalize_charge_type(0xFF), 1);
    }
}
