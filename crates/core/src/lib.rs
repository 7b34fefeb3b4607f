//! mamba-ctl-core: Razer report protocol, transport, and mouse configuration.
//!
//! This crate provides the cross-platform core logic for configuring a
//! Razer Mamba over its 90-byte USB feature-report control protocol.

pub mod attributes;
pub mod device;
pub mod dpi;
pub mod effects;
pub mod error;
#[cfg(test)]
mod integration_tests;
pub mod power;
pub mod profile;
pub mod report;
pub mod safety;
pub mod transport;

/// Razer USB Vendor ID.
pub const RAZER_VID: u16 = 0x1532;

/// Known Razer Mamba product IDs.
pub mod pids {
    /// Mamba, wired.
    pub const MAMBA_WIRED: u16 = 0x0044;
    /// Mamba, wireless receiver.
    pub const MAMBA_WIRELESS: u16 = 0x0045;
}
