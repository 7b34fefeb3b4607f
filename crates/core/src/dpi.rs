//! Sensor DPI (group 0x04).
//!
//! Command 0x05, sub-command 0x00:
//!   params[0..2] = X DPI (big-endian)
//!   params[2..4] = Y DPI (big-endian)
//!   params[4..6] = reserved, zero

use crate::error::Result;
use crate::report::{groups, Frame};
use crate::safety;
use crate::transport::{send_command, Transport};

const SET_DPI: u8 = 0x05;

/// Set X and Y DPI. Each axis is capped at 16000.
pub fn set_mouse_dpi(transport: &dyn Transport, dpi_x: u16, dpi_y: u16) -> Result<()> {
    let [x_hi, x_lo] = safety::clamp_dpi("x", dpi_x).to_be_bytes();
    let [y_hi, y_lo] = safety::clamp_dpi("y", dpi_y).to_be_bytes();

    let frame = Frame::prepare(
        groups::DPI,
        SET_DPI,
        0x00,
        0x07,
        &[x_hi, x_lo, y_hi, y_lo, 0x00, 0x00],
    )?;
    send_command(transport, "set_mouse_dpi", frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockControl;
    use crate::transport::TransportClient;

    #[test]
    fn set_dpi_encodes_both_axes() {
        let mock = MockControl::new();
        let client = TransportClient::new(mock.clone());

        // 800 = 0x0320, 1600 = 0x0640
        set_mouse_dpi(&client, 800, 1600).unwrap();
        let frame = mock.last_write();
        assert_eq!(&frame[2..6], &[0x07, 0x04, 0x05, 0x00]);
        assert_eq!(&frame[6..12], &[0x03, 0x20, 0x06, 0x40, 0x00, 0x00]);
    }

    #[test]
    fn set_dpi_caps_each_axis() {
        let mock = MockControl::new();
        let client = TransportClient::new(mock.clone());

        set_mouse_dpi(&client, 20000, 20000).unwrap();
        let capped = mock.last_write();
        set_mouse_dpi(&client, 16000, 16000).unwrap();
        assert_eq!(mock.last_write(), capped);
        // 16000 = 0x3E80
        assert_eq!(&capped[6..10], &[0x3E, 0x80, 0x3E, 0x80]);

        set_mouse_dpi(&client, 400, 30000).unwrap();
        assert_eq!(&mock.last_write()[6..10], &[0x01, 0x90, 0x3E, 0x80]);
    }
}
