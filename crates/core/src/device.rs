//! Device model: discovery and identity.

use crate::error::{Error, Result};
use crate::report::{groups, Frame, SUB_COMMAND_OFFSET};
use crate::transport::{query_command, Transport};
use crate::{pids, RAZER_VID};
use tracing::{debug, info, warn};

/// HID interface that takes set-feature-report requests (wIndex 2).
pub const WRITE_INTERFACE: i32 = 2;

/// HID interface that answers get-feature-report requests (wIndex 1).
pub const READ_INTERFACE: i32 = 1;

/// Maximum serial number length carried in a reply.
pub const SERIAL_LEN: usize = 20;

const GET_SERIAL: u8 = 0x82;

/// Supported Razer mouse models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseModel {
    MambaWired,
    MambaWireless,
}

impl MouseModel {
    /// Look up model from USB product ID.
    pub fn from_pid(pid: u16) -> Option<Self> {
        match pid {
            pids::MAMBA_WIRED => Some(Self::MambaWired),
            pids::MAMBA_WIRELESS => Some(Self::MambaWireless),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MambaWired => "Razer Mamba (wired)",
            Self::MambaWireless => "Razer Mamba (wireless)",
        }
    }

    /// USB Product ID.
    pub fn pid(&self) -> u16 {
        match self {
            Self::MambaWired => pids::MAMBA_WIRED,
            Self::MambaWireless => pids::MAMBA_WIRELESS,
        }
    }
}

/// Information about a discovered Razer device.
///
/// Requests go out on one HID interface and replies come back on another,
/// so each device carries two paths.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub model: MouseModel,
    pub vid: u16,
    pub pid: u16,
    /// hidapi path of the write interface.
    pub write_path: String,
    /// hidapi path of the read interface.
    pub read_path: String,
    pub serial: Option<String>,
}

impl DeviceInfo {
    /// True if either interface of this device lives at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.write_path == path || self.read_path == path
    }
}

/// One HID interface seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InterfaceEntry {
    pid: u16,
    interface: i32,
    path: String,
    serial: Option<String>,
}

/// Discover all connected Razer Mamba mice.
pub fn discover_devices() -> Result<Vec<DeviceInfo>> {
    debug!("Starting HID device enumeration");
    let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;

    let entries = api
        .device_list()
        .filter(|info| {
            info.vendor_id() == RAZER_VID
                && MouseModel::from_pid(info.product_id()).is_some()
                && matches!(info.interface_number(), READ_INTERFACE | WRITE_INTERFACE)
        })
        .map(|info| InterfaceEntry {
            pid: info.product_id(),
            interface: info.interface_number(),
            path: info.path().to_string_lossy().into_owned(),
            serial: info.serial_number().map(|s| s.to_string()),
        })
        .collect();

    let devices = pair_interfaces(entries);
    debug!(count = devices.len(), "Device enumeration complete");
    Ok(devices)
}

/// Pair each write interface with the read interface of the same mouse.
///
/// Interfaces match on product id and serial number; with several
/// identical mice, enumeration order decides.
fn pair_interfaces(entries: Vec<InterfaceEntry>) -> Vec<DeviceInfo> {
    let (mut reads, writes): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .filter(|e| matches!(e.interface, READ_INTERFACE | WRITE_INTERFACE))
        .partition(|e| e.interface == READ_INTERFACE);

    let mut devices = Vec::new();
    for write in writes {
        let Some(model) = MouseModel::from_pid(write.pid) else {
            continue;
        };
        let Some(pos) = reads
            .iter()
            .position(|r| r.pid == write.pid && r.serial == write.serial)
        else {
            warn!(path = %write.path, "no read interface found, skipping device");
            continue;
        };
        let read = reads.remove(pos);

        info!(
            model = model.name(),
            pid = format_args!("0x{:04X}", write.pid),
            write_path = %write.path,
            read_path = %read.path,
            "Found Razer device"
        );
        devices.push(DeviceInfo {
            model,
            vid: RAZER_VID,
            pid: write.pid,
            write_path: write.path,
            read_path: read.path,
            serial: write.serial,
        });
    }
    devices
}

/// Read the serial number stored in the device.
///
/// The reply carries up to 20 ASCII bytes starting at the sub-command byte.
pub fn read_serial(transport: &dyn Transport) -> Result<String> {
    let priming = Frame::prepare(groups::INFO, GET_SERIAL, 0x00, 0x16, &[])?;
    let reply = query_command(transport, "get_serial", priming, false)?;

    let raw = &reply.as_bytes()[SUB_COMMAND_OFFSET..SUB_COMMAND_OFFSET + SERIAL_LEN];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let serial = String::from_utf8_lossy(&raw[..end]).into_owned();
    debug!(serial = %serial, "serial number");
    Ok(serial)
}

/// Serial number, or an empty string on failure.
pub fn get_serial(transport: &dyn Transport) -> String {
    read_serial(transport).unwrap_or_default()
}
