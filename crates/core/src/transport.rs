//! Control-channel transport for 90-byte reports.
//!
//! [`ControlTransfer`] is the host's feature-report primitive (hidapi in the
//! CLI, a mock in tests). [`TransportClient`] wraps it with the exchange
//! discipline the device needs: one exchange at a time, and a settle window
//! after every transfer.

use crate::error::{Error, Result, TransferError};
use crate::report::{validate_reply, Frame, REPORT_LEN};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{trace, warn};

/// Minimum idle time the device needs after every control transfer.
pub const SETTLE_WINDOW: Duration = Duration::from_micros(600);

/// Feature report id used for every exchange (wValue 0x0300).
pub const REPORT_ID: u8 = 0x00;

/// Raw feature-report access to one physical device.
///
/// Both calls move the bare 90-byte frame; report id framing, if the host
/// API needs any, is the implementation's concern.
pub trait ControlTransfer: Send {
    /// Set-feature-report, host to device. Returns the number of bytes transferred.
    fn set_feature_report(&mut self, data: &[u8]) -> Result<usize>;

    /// Get-feature-report, device to host. Returns the number of bytes received.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Frame-level exchange, as used by the command catalog.
pub trait Transport: Send + Sync {
    /// Finalize and send a request frame.
    fn send(&self, frame: Frame) -> std::result::Result<(), TransferError>;

    /// Send a priming frame, then read back the device's reply.
    fn query(&self, priming: Frame) -> std::result::Result<Frame, TransferError>;
}

/// Serializes all exchanges with one device behind a lock.
pub struct TransportClient<C> {
    control: Mutex<C>,
}

impl<C: ControlTransfer> TransportClient<C> {
    pub fn new(control: C) -> Self {
        Self {
            control: Mutex::new(control),
        }
    }

    /// Release the underlying control primitive.
    pub fn into_inner(self) -> C {
        self.control
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, C> {
        // A panic mid-exchange leaves no frame state behind, so a poisoned
        // lock is still usable.
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn send_locked<C: ControlTransfer>(
    control: &mut C,
    mut frame: Frame,
) -> std::result::Result<(), TransferError> {
    frame.finalize();
    trace!(
        group = format_args!("0x{:02X}", frame.group()),
        command = format_args!("0x{:02X}", frame.command()),
        sub_command = format_args!("0x{:02X}", frame.sub_command()),
        report_hex = format_args!("{:02X?}", frame.as_bytes()),
        "report TX"
    );

    let result = control.set_feature_report(frame.as_bytes());
    thread::sleep(SETTLE_WINDOW);

    match result {
        Ok(REPORT_LEN) => Ok(()),
        Ok(written) => {
            warn!(written, "short feature report write");
            Err(TransferError::ShortWrite {
                written,
                expected: REPORT_LEN,
            })
        }
        Err(e) => {
            warn!(error = %e, "feature report write failed");
            Err(TransferError::ShortWrite {
                written: 0,
                expected: REPORT_LEN,
            })
        }
    }
}

fn read_locked<C: ControlTransfer>(control: &mut C) -> std::result::Result<Frame, TransferError> {
    let mut buf = [0u8; REPORT_LEN];
    let result = control.get_feature_report(&mut buf);
    thread::sleep(SETTLE_WINDOW);

    let read = match result {
        Ok(read) => read,
        Err(e) => {
            warn!(error = %e, "feature report read failed");
            0
        }
    };
    if read != REPORT_LEN {
        warn!(read, "short feature report read");
        return Err(TransferError::ShortRead {
            read,
            expected: REPORT_LEN,
        });
    }

    let reply = Frame::from_raw(buf);
    trace!(
        status = format_args!("0x{:02X}", reply.status()),
        report_hex = format_args!("{:02X?}", reply.as_bytes()),
        "report RX"
    );
    Ok(reply)
}

impl<C: ControlTransfer> Transport for TransportClient<C> {
    fn send(&self, frame: Frame) -> std::result::Result<(), TransferError> {
        let mut control = self.lock();
        send_locked(&mut *control, frame)
    }

    fn query(&self, priming: Frame) -> std::result::Result<Frame, TransferError> {
        let mut control = self.lock();
        // The priming write arms the register the read returns; a failed
        // write is logged and the read still goes ahead.
        let _ = send_locked(&mut *control, priming);
        read_locked(&mut *control)
    }
}

/// Send a request frame for a catalog write, logging failure.
pub(crate) fn send_command(
    transport: &dyn Transport,
    operation: &'static str,
    frame: Frame,
) -> Result<()> {
    transport.send(frame).map_err(|e| {
        warn!(operation, error = %e, "command failed");
        Error::from(e)
    })
}

/// Query the device and check the reply echoes the request header.
///
/// `echo_sub_command` is false for commands whose reply carries data in byte 5.
pub(crate) fn query_command(
    transport: &dyn Transport,
    operation: &'static str,
    priming: Frame,
    echo_sub_command: bool,
) -> Result<Frame> {
    let (group, command, sub_command) =
        (priming.group(), priming.command(), priming.sub_command());
    let reply = transport.query(priming).map_err(|e| {
        warn!(operation, error = %e, "query failed");
        Error::from(e)
    })?;

    let expected_sub = echo_sub_command.then_some(sub_command);
    if let Err(e) = validate_reply(reply.as_bytes(), group, command, expected_sub) {
        warn!(
            operation,
            error = %e,
            status = format_args!("0x{:02X}", reply.status()),
            transport = format_args!("0x{:02X}", reply.transport_class()),
            count = reply.parameter_count(),
            group = format_args!("0x{:02X}", reply.group()),
            command = format_args!("0x{:02X}", reply.command()),
            sub_command = format_args!("0x{:02X}", reply.sub_command()),
            param0 = format_args!("0x{:02X}", reply.params()[0]),
            "reply does not match request"
        );
        return Err(e.into());
    }
    Ok(reply)
}

/// A mock control channel for testing.
///
/// Records every transfer in order and replays queued replies.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Instant;

    /// One observed transfer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Write(Vec<u8>),
        Read,
    }

    #[derive(Default)]
    struct State {
        events: Vec<Event>,
        times: Vec<Instant>,
        replies: VecDeque<Vec<u8>>,
        write_len: Option<usize>,
        fail_write_at: Option<usize>,
    }

    /// Cloneable handle; clones share the same recorded state.
    #[derive(Clone, Default)]
    pub struct MockControl {
        state: Arc<Mutex<State>>,
    }

    impl MockControl {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a raw reply for the next read.
        pub fn push_reply(&self, reply: Vec<u8>) {
            self.state.lock().unwrap().replies.push_back(reply);
        }

        /// Queue a well-formed reply echoing the given header.
        pub fn push_reply_for(&self, group: u8, command: u8, sub_command: u8, params: &[u8]) {
            let mut reply = vec![0u8; REPORT_LEN];
            reply[0] = 0x02;
            reply[3] = group;
            reply[4] = command;
            reply[5] = sub_command;
            reply[6..6 + params.len()].copy_from_slice(params);
            self.push_reply(reply);
        }

        /// Report this many bytes written for every write.
        pub fn set_write_len(&self, len: usize) {
            self.state.lock().unwrap().write_len = Some(len);
        }

        /// Fail the write with this zero-based index.
        pub fn fail_write_at(&self, index: usize) {
            self.state.lock().unwrap().fail_write_at = Some(index);
        }

        pub fn events(&self) -> Vec<Event> {
            self.state.lock().unwrap().events.clone()
        }

        /// When each event started, parallel to [`MockControl::events`].
        pub fn event_times(&self) -> Vec<Instant> {
            self.state.lock().unwrap().times.clone()
        }

        /// All outbound frames, in order.
        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Write(data) => Some(data),
                    Event::Read => None,
                })
                .collect()
        }

        pub fn last_write(&self) -> Vec<u8> {
            self.writes().pop().expect("no frame was written")
        }
    }

    impl ControlTransfer for MockControl {
        fn set_feature_report(&mut self, data: &[u8]) -> Result<usize> {
            let mut state = self.state.lock().unwrap();
            let index = state
                .events
                .iter()
                .filter(|e| matches!(e, Event::Write(_)))
                .count();
            state.events.push(Event::Write(data.to_vec()));
            state.times.push(Instant::now());
            if state.fail_write_at == Some(index) {
                return Err(Error::Hid("mock: write failed".into()));
            }
            Ok(state.write_len.unwrap_or(data.len()))
        }

        fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
            let mut state = self.state.lock().unwrap();
            state.events.push(Event::Read);
            state.times.push(Instant::now());
            let reply = state
                .replies
                .pop_front()
                .ok_or_else(|| Error::Hid("mock: no reply queued".into()))?;
            let n = reply.len().min(buf.len());
            buf[..n].copy_from_slice(&reply[..n]);
            Ok(n)
        }
    }
}
