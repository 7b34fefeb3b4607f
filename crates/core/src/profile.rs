//! Saved device profiles.
//!
//! A profile is a JSON file holding every writable setting. Applying it
//! issues one catalog write per setting.

use crate::dpi;
use crate::effects::{self, Effect};
use crate::error::{Error, Result};
use crate::power;
use crate::report::Rgb;
use crate::safety::{DPI_DEFAULT, IDLE_TIME_MAX, LOW_BATTERY_THRESHOLD_MAX};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Behaviour while the mouse is on its charging dock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Charging {
    /// Keep showing the current effect.
    CurrentEffect,
    /// Show a fixed charging colour.
    Colour { colour: Rgb },
}

/// A saved mouse configuration profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile display name.
    pub name: String,
    pub effect: Effect,
    pub dpi_x: u16,
    pub dpi_y: u16,
    /// Seconds before the mouse sleeps.
    pub idle_time: u16,
    /// Raw threshold byte; 0x3F = 25%.
    pub low_battery_threshold: u8,
    pub wireless_brightness: u8,
    pub charging: Charging,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Default".into(),
            effect: Effect::Spectrum,
            dpi_x: DPI_DEFAULT,
            dpi_y: DPI_DEFAULT,
            idle_time: IDLE_TIME_MAX,
            low_battery_threshold: LOW_BATTERY_THRESHOLD_MAX,
            wireless_brightness: 0xFF,
            charging: Charging::Colour { colour: Rgb::RED },
        }
    }
}

/// Save a profile as pretty-printed JSON.
pub fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| Error::Profile(format!("serialize: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| Error::Profile(format!("write {}: {e}", path.display())))?;
    info!(path = %path.display(), name = %profile.name, "Profile saved");
    Ok(())
}

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Profile(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| Error::Profile(format!("parse {}: {e}", path.display())))
}

/// Write every setting of a profile to the device.
///
/// Keeps going past individual failures (each is logged by the catalog) and
/// returns how many writes failed.
pub fn apply_profile(transport: &dyn Transport, profile: &Profile) -> usize {
    let results = [
        dpi::set_mouse_dpi(transport, profile.dpi_x, profile.dpi_y),
        power::set_idle_time(transport, profile.idle_time),
        power::set_low_battery_threshold(transport, profile.low_battery_threshold),
        power::set_wireless_brightness(transport, profile.wireless_brightness),
        effects::set_effect(transport, &profile.effect),
        match profile.charging {
            Charging::CurrentEffect => effects::set_charging_effect(transport, 0x00),
            Charging::Colour { colour } => effects::set_charging_colour(transport, colour),
        },
    ];

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(profile = %profile.name, failed, "profile applied with failures");
    } else {
        info!(profile = %profile.name, "profile applied");
    }
    failed
}
