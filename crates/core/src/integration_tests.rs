//! Integration tests: exercise the full flow using a simulated Mamba.
//!
//! These tests drive a [`MouseSession`] over a mock control channel and
//! check the frames that reach the wire, through the attribute boundary,
//! the catalog, the codec and the transport together.

#[cfg(test)]
mod tests {
    use crate::attributes::{Attribute, MouseSession};
    use crate::device;
    use crate::dpi;
    use crate::effects::{self, WaveDirection};
    use crate::power;
    use crate::profile::{self, Profile};
    use crate::report::{checksum, groups, Rgb, CHECKSUM_OFFSET, REPORT_LEN};
    use crate::transport::mock::{Event, MockControl};
    use crate::transport::Transport;

    /// An out-of-range call and the call at its clamp limit.
    type ClampPair = (fn(&dyn Transport), fn(&dyn Transport));

    fn create_mock_mamba() -> (MockControl, MouseSession<MockControl>) {
        let mock = MockControl::new();
        let session = MouseSession::new(mock.clone());
        (mock, session)
    }

    fn assert_well_formed(frame: &[u8]) {
        assert_eq!(frame.len(), REPORT_LEN);
        assert_eq!(frame[0], 0x00);
        assert_eq!(frame[1], 0xFF);
        assert_eq!(frame[CHECKSUM_OFFSET], checksum(frame));
        assert_eq!(frame[86], 0);
        assert_eq!(frame[87], 0);
        assert_eq!(frame[89], 0);
    }

    /// Test: every frame the catalog emits is 90 bytes with a valid checksum.
    #[test]
    fn every_write_is_well_formed() {
        let (mock, session) = create_mock_mamba();
        let t = session.transport();

        effects::set_wave_mode(t, WaveDirection::Up).unwrap();
        effects::set_static_mode(t, Rgb::new(0x12, 0x34, 0x56)).unwrap();
        effects::set_spectrum_mode(t).unwrap();
        effects::set_reactive_mode(t, 2, Rgb::RED).unwrap();
        effects::set_breath_mode(t, 2, Rgb::RED, Rgb::new(0, 0, 0xFF)).unwrap();
        effects::set_charging_colour(t, Rgb::new(0, 0xFF, 0)).unwrap();
        power::set_wireless_brightness(t, 0x40).unwrap();
        power::set_low_battery_threshold(t, 0x26).unwrap();
        power::set_idle_time(t, 600).unwrap();
        dpi::set_mouse_dpi(t, 3200, 3200).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 11);
        for frame in &writes {
            assert_well_formed(frame);
        }
    }

    /// Test: full status read through the attribute surface.
    #[test]
    fn full_status_read() {
        let (mock, session) = create_mock_mamba();
        mock.push_reply_for(groups::POWER, 0x80, 0x00, &[200]);
        mock.push_reply_for(groups::POWER, 0x84, 0x00, &[1]);
        let mut serial = vec![0u8; REPORT_LEN];
        serial[0] = 0x02;
        serial[3] = groups::INFO;
        serial[4] = 0x82;
        serial[5..17].copy_from_slice(b"PM1501H12345");
        mock.push_reply(serial);

        assert_eq!(session.read_attribute(Attribute::GetBattery), "200\n");
        assert_eq!(session.read_attribute(Attribute::IsCharging), "1\n");
        assert_eq!(session.read_attribute(Attribute::GetSerial), "PM1501H12345\n");

        let events = mock.events();
        assert_eq!(events.len(), 6);
        for pair in events.chunks(2) {
            match &pair[0] {
                Event::Write(frame) => assert_well_formed(frame),
                Event::Read => panic!("read before priming write"),
            }
            assert_eq!(pair[1], Event::Read);
        }
    }

    /// Test: a reply with the wrong status marker degrades to the sentinel.
    #[test]
    fn invalid_reply_degrades_to_sentinel() {
        let (mock, session) = create_mock_mamba();
        let mut reply = vec![0u8; REPORT_LEN];
        reply[0] = 0x01;
        reply[3] = groups::POWER;
        reply[4] = 0x80;
        reply[6] = 200;
        mock.push_reply(reply);
        assert_eq!(power::get_battery_level(session.transport()), -1);

        mock.push_reply(vec![0x02; 50]);
        assert_eq!(power::is_charging(session.transport()), -1);

        assert_eq!(device::get_serial(session.transport()), "");
    }

    /// Test: clamped inputs encode exactly like their clamp limits.
    #[test]
    fn clamps_are_idempotent_on_the_wire() {
        let (mock, session) = create_mock_mamba();
        let t = session.transport();

        let pairs: [ClampPair; 4] = [
            (
                |t| power::set_idle_time(t, 1000).unwrap(),
                |t| power::set_idle_time(t, 900).unwrap(),
            ),
            (
                |t| dpi::set_mouse_dpi(t, 20000, 20000).unwrap(),
                |t| dpi::set_mouse_dpi(t, 16000, 16000).unwrap(),
            ),
            (
                |t| power::set_low_battery_threshold(t, 0x50).unwrap(),
                |t| power::set_low_battery_threshold(t, 0x3F).unwrap(),
            ),
            (
                |t| effects::set_reactive_mode(t, 10, Rgb::RED).unwrap(),
                |t| effects::set_reactive_mode(t, 3, Rgb::RED).unwrap(),
            ),
        ];
        for (out_of_range, limit) in pairs {
            out_of_range(t);
            let a = mock.last_write();
            limit(t);
            assert_eq!(mock.last_write(), a);
        }
    }

    /// Test: attribute writes and direct catalog calls produce identical frames.
    #[test]
    fn attribute_and_catalog_agree() {
        let (mock, session) = create_mock_mamba();

        session
            .write_attribute(Attribute::SetMouseDpi, &[0x0C, 0x80])
            .unwrap();
        let via_attribute = mock.last_write();
        dpi::set_mouse_dpi(session.transport(), 3200, 3200).unwrap();
        assert_eq!(mock.last_write(), via_attribute);

        session
            .write_attribute(Attribute::ModeWave, b"1\n")
            .unwrap();
        let via_attribute = mock.last_write();
        effects::set_wave_mode(session.transport(), WaveDirection::Up).unwrap();
        assert_eq!(mock.last_write(), via_attribute);
    }

    /// Test: concurrent attribute access from multiple threads stays ordered.
    #[test]
    fn concurrent_session_calls_are_serialized() {
        use std::sync::Arc;
        use std::thread;

        let (mock, session) = create_mock_mamba();
        for _ in 0..4 {
            mock.push_reply_for(groups::POWER, 0x80, 0x00, &[150]);
        }
        let session = Arc::new(session);

        let mut handles = vec![];
        for i in 0..4u8 {
            let reader = Arc::clone(&session);
            handles.push(thread::spawn(move || {
                assert_eq!(reader.read_attribute(Attribute::GetBattery), "150\n");
            }));
            let writer = Arc::clone(&session);
            handles.push(thread::spawn(move || {
                writer
                    .write_attribute(Attribute::ModeStatic, &[i, i, i])
                    .unwrap();
            }));
        }
        for h in handles {
            h.join().expect("thread panicked");
        }

        // Every read directly follows its own priming write.
        let events = mock.events();
        assert_eq!(events.len(), 12);
        for (i, event) in events.iter().enumerate() {
            if *event == Event::Read {
                match &events[i - 1] {
                    Event::Write(frame) => assert_eq!(frame[4], 0x80),
                    Event::Read => panic!("reads interleaved"),
                }
            }
        }
    }

    /// Test: profile applied through a session reaches the device in order.
    #[test]
    fn profile_applies_through_session() {
        let (mock, session) = create_mock_mamba();
        let profile = Profile {
            effect: effects::Effect::Static {
                colour: Rgb::new(0x00, 0x80, 0xFF),
            },
            ..Profile::default()
        };
        assert_eq!(profile::apply_profile(session.transport(), &profile), 0);

        let writes = mock.writes();
        assert_eq!(writes.len(), 7);
        let effect = &writes[4];
        assert_eq!(&effect[3..9], &[0x03, 0x0A, 0x06, 0x00, 0x80, 0xFF]);
    }

    /// Test: dropping a session hands back the control primitive untouched.
    #[test]
    fn session_teardown_returns_control() {
        let (mock, session) = create_mock_mamba();
        session
            .write_attribute(Attribute::ModeSpectrum, b"")
            .unwrap();
        let control = session.into_control();
        assert_eq!(control.writes().len(), 1);
        assert_eq!(mock.writes().len(), 1);
    }
}
