//! mamba-ctl CLI: command-line Razer Mamba configuration tool.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mamba_ctl_core::attributes::{Attribute, MouseSession};
use mamba_ctl_core::effects::{self, WaveDirection};
use mamba_ctl_core::error::Error as CoreError;
use mamba_ctl_core::report::Rgb;
use mamba_ctl_core::transport::{ControlTransfer, REPORT_ID};
use mamba_ctl_core::{device, dpi, power, profile};
use std::ffi::CString;
use std::path::PathBuf;

/// Feature-report access through hidapi.
///
/// Requests are sent on the write interface and replies fetched from the
/// read interface. hidapi expects the report id as the first byte of every
/// feature report buffer; it is added on send and stripped on receive.
struct HidapiControl {
    writer: hidapi::HidDevice,
    reader: hidapi::HidDevice,
}

impl HidapiControl {
    fn open(path: Option<&str>) -> Result<Self> {
        let devices = device::discover_devices()?;
        let target = match path {
            Some(path) => devices
                .iter()
                .find(|d| d.has_path(path))
                .ok_or_else(|| CoreError::DeviceNotFound(path.to_string()))?,
            None => devices
                .first()
                .ok_or_else(|| CoreError::DeviceNotFound("no Razer Mamba connected".into()))?,
        };

        let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;
        let open_path = |path: &str| -> Result<hidapi::HidDevice> {
            let c_path = CString::new(path)?;
            api.open_path(&c_path).map_err(|e| {
                anyhow::anyhow!(
                    "open HID device {path} (VID=0x{:04X} PID=0x{:04X}): {e}",
                    target.vid,
                    target.pid
                )
            })
        };
        let writer = open_path(&target.write_path)?;
        let reader = open_path(&target.read_path)?;
        tracing::debug!(
            model = target.model.name(),
            write_path = %target.write_path,
            read_path = %target.read_path,
            "Opened device"
        );

        Ok(Self { writer, reader })
    }
}

impl ControlTransfer for HidapiControl {
    fn set_feature_report(&mut self, data: &[u8]) -> mamba_ctl_core::error::Result<usize> {
        let mut buf = Vec::with_capacity(data.len() + 1);
        buf.push(REPORT_ID);
        buf.extend_from_slice(data);
        self.writer
            .send_feature_report(&buf)
            .map_err(|e| CoreError::Hid(format!("send_feature_report: {e}")))?;
        Ok(data.len())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> mamba_ctl_core::error::Result<usize> {
        let mut raw = vec![0u8; buf.len() + 1];
        raw[0] = REPORT_ID;
        let n = self
            .reader
            .get_feature_report(&mut raw)
            .map_err(|e| CoreError::Hid(format!("get_feature_report: {e}")))?;
        let payload = n.saturating_sub(1).min(buf.len());
        buf[..payload].copy_from_slice(&raw[1..1 + payload]);
        Ok(payload)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for WaveDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => WaveDirection::Up,
            Direction::Down => WaveDirection::Down,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "mamba-ctl",
    version,
    about = "Razer Mamba lighting, DPI and power configuration"
)]
struct Cli {
    /// HID path of either interface of the device to use (see list-devices).
    /// Defaults to the first one found.
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected Razer Mamba mice.
    ListDevices,
    /// Show battery level.
    Battery,
    /// Show whether the mouse is charging.
    Charging,
    /// Show the device serial number.
    Serial,
    /// Static colour effect.
    Static {
        /// Colour as RRGGBB.
        colour: Rgb,
    },
    /// Wave effect.
    Wave {
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Spectrum cycling effect.
    Spectrum,
    /// Reactive effect.
    Reactive {
        /// 1 short, 2 medium, 3 long.
        speed: u8,
        /// Colour as RRGGBB.
        colour: Rgb,
    },
    /// Breathing effect: no colour for random, one or two colours as RRGGBB.
    Breath {
        #[arg(num_args = 0..=2)]
        colours: Vec<Rgb>,
    },
    /// Set LED brightness on battery (0-255).
    Brightness { value: u8 },
    /// Set low battery blink threshold (0x3F = 25%, capped there).
    LowBattery { threshold: u8 },
    /// Set idle time before sleep in seconds (max 900).
    IdleTime { seconds: u16 },
    /// Set DPI (max 16000 per axis). Y defaults to X.
    Dpi { x: u16, y: Option<u16> },
    /// Charging effect: 0 keeps the current effect, 1 uses the charging colour.
    ChargingEffect { charge_type: u8 },
    /// Set the charging colour.
    ChargingColour {
        /// Colour as RRGGBB.
        colour: Rgb,
    },
    /// Read a named attribute.
    AttrRead { name: String },
    /// Write a named attribute.
    AttrWrite {
        name: String,
        /// Value; text by default, or hex bytes with --hex.
        value: String,
        #[arg(long)]
        hex: bool,
    },
    /// Apply a saved profile.
    ApplyProfile { path: PathBuf },
    /// Save the default profile to a file.
    SaveProfile { path: PathBuf },
    /// Print a profile as JSON (the default profile if no path is given).
    ShowProfile { path: Option<PathBuf> },
}

fn parse_hex(value: &str) -> Result<Vec<u8>> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.len().is_multiple_of(2) || !digits.is_ascii() {
        anyhow::bail!("hex value must have an even number of digits: '{value}'");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| anyhow::anyhow!("invalid hex '{}': {e}", &digits[i..i + 2]))
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let open = || -> Result<MouseSession<HidapiControl>> {
        Ok(MouseSession::new(HidapiControl::open(cli.device.as_deref())?))
    };

    match cli.command {
        Commands::ListDevices => {
            let devices = device::discover_devices()?;
            if devices.is_empty() {
                println!("No Razer Mamba mice found.");
                println!("Ensure your mouse is connected and udev permissions are set up.");
            } else {
                for dev in &devices {
                    println!(
                        "{} (VID: 0x{:04X}, PID: 0x{:04X}, serial: {})",
                        dev.model.name(),
                        dev.vid,
                        dev.pid,
                        dev.serial.as_deref().unwrap_or("unknown")
                    );
                    println!("  write: {}", dev.write_path);
                    println!("  read:  {}", dev.read_path);
                }
            }
        }
        Commands::Battery => {
            let session = open()?;
            let level = power::read_battery_level(session.transport())?;
            println!(
                "Battery: {}% (raw {level})",
                u32::from(level) * 100 / 255
            );
        }
        Commands::Charging => {
            let session = open()?;
            let flag = power::read_charging(session.transport())?;
            println!("Charging: {}", if flag != 0 { "yes" } else { "no" });
        }
        Commands::Serial => {
            let session = open()?;
            println!("Serial: {}", device::read_serial(session.transport())?);
        }
        Commands::Static { colour } => {
            let session = open()?;
            effects::set_static_mode(session.transport(), colour)?;
            println!("Static effect set to {colour}");
        }
        Commands::Wave { direction } => {
            let session = open()?;
            effects::set_wave_mode(session.transport(), direction.into())?;
            println!("Wave effect set");
        }
        Commands::Spectrum => {
            let session = open()?;
            effects::set_spectrum_mode(session.transport())?;
            println!("Spectrum effect set");
        }
        Commands::Reactive { speed, colour } => {
            let session = open()?;
            effects::set_reactive_mode(session.transport(), speed, colour)?;
            println!("Reactive effect set to {colour}");
        }
        Commands::Breath { colours } => {
            let session = open()?;
            let (breath_type, first, second) = match colours.as_slice() {
                [single] => (0x01, *single, Rgb::BLACK),
                [first, second] => (0x02, *first, *second),
                _ => (0x03, Rgb::BLACK, Rgb::BLACK),
            };
            effects::set_breath_mode(session.transport(), breath_type, first, second)?;
            println!("Breathing effect set");
        }
        Commands::Brightness { value } => {
            let session = open()?;
            power::set_wireless_brightness(session.transport(), value)?;
            println!("Wireless brightness set to {value}");
        }
        Commands::LowBattery { threshold } => {
            let session = open()?;
            power::set_low_battery_threshold(session.transport(), threshold)?;
            println!("Low battery threshold set");
        }
        Commands::IdleTime { seconds } => {
            let session = open()?;
            power::set_idle_time(session.transport(), seconds)?;
            println!("Idle time set");
        }
        Commands::Dpi { x, y } => {
            let session = open()?;
            let y = y.unwrap_or(x);
            dpi::set_mouse_dpi(session.transport(), x, y)?;
            println!("DPI set to {x}x{y} (capped at 16000)");
        }
        Commands::ChargingEffect { charge_type } => {
            let session = open()?;
            effects::set_charging_effect(session.transport(), charge_type)?;
            println!("Charging effect set");
        }
        Commands::ChargingColour { colour } => {
            let session = open()?;
            effects::set_charging_colour(session.transport(), colour)?;
            println!("Charging colour set to {colour}");
        }
        Commands::AttrRead { name } => {
            let attribute = Attribute::from_name(&name)?;
            let session = open()?;
            print!("{}", session.read_attribute(attribute));
        }
        Commands::AttrWrite { name, value, hex } => {
            let attribute = Attribute::from_name(&name)?;
            let bytes = if hex {
                parse_hex(&value)?
            } else {
                value.into_bytes()
            };
            let session = open()?;
            session.write_attribute(attribute, &bytes)?;
        }
        Commands::ApplyProfile { path } => {
            let loaded = profile::load_profile(&path)?;
            let session = open()?;
            let failed = profile::apply_profile(session.transport(), &loaded);
            if failed > 0 {
                anyhow::bail!("profile '{}' applied with {failed} failed writes", loaded.name);
            }
            println!("Applied profile '{}'", loaded.name);
        }
        Commands::SaveProfile { path } => {
            profile::save_profile(&path, &profile::Profile::default())?;
            println!("Profile saved to {}", path.display());
        }
        Commands::ShowProfile { path } => {
            let shown = match path {
                Some(path) => profile::load_profile(&path)?,
                None => profile::Profile::default(),
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}
