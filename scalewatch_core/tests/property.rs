use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::bounded;
use proptest::prelude::*;
use scalewatch_core::control::ControlCfg;
use scalewatch_core::dialog::MAX_DIGITS;
use scalewatch_core::mocks::{SharedScale, SpyActuator};
use scalewatch_core::{ControlCmd, ControlTask, Dialog, DialogKind, DialogStatus, Mode, SharedState};
use scalewatch_traits::clock::TestClock;
use scalewatch_traits::{Channel, Key, Level};

proptest! {
    /// Relay pulses never overlap: the actuation log for the relay
    /// channel strictly alternates On, Off regardless of how the
    /// weight moves or how unevenly the control loop is scheduled.
    #[test]
    fn relay_pulses_never_overlap(
        raws in prop::collection::vec(-100i32..200, 1..60),
        gaps in prop::collection::vec(10u64..200, 1..60),
        delay_ms in 0u32..500,
    ) {
        let clock = Arc::new(TestClock::new());
        let state = Arc::new(SharedState::new(1.0, 50.0, delay_ms));
        state.set_mode(Mode::Running);
        let (scale, raw) = SharedScale::new(0);
        let spy = SpyActuator::new();
        let (_tx, rx) = bounded::<ControlCmd>(1);
        let mut task = ControlTask::new(
            scale,
            spy.clone(),
            state,
            ControlCfg { sample_window: 1, pulse_ms: 350, fault_limit: 10 },
            Duration::from_millis(10),
            clock.clone(),
            rx,
        );

        for (r, gap) in raws.iter().zip(gaps.iter().cycle()) {
            *raw.lock().unwrap() = *r;
            task.step().unwrap();
            clock.advance(Duration::from_millis(*gap));
        }

        let mut relay_on = false;
        for (channel, level) in spy.log() {
            if channel != Channel::Relay {
                continue;
            }
            match level {
                Level::On => {
                    prop_assert!(!relay_on, "relay asserted while already on");
                    relay_on = true;
                }
                Level::Off => {
                    prop_assert!(relay_on, "relay released while already off");
                    relay_on = false;
                }
            }
        }
    }

    /// Whatever digits the operator types, a successful save parses to
    /// exactly the first `MAX_DIGITS` of them.
    #[test]
    fn digit_entry_parses_accepted_prefix(digits in prop::collection::vec(0u8..10, 1..12)) {
        let mut dialog = Dialog::new(DialogKind::SetLimit);
        for &d in &digits {
            prop_assert_eq!(dialog.handle_key(Key::Digit(d)), DialogStatus::Entering);
        }

        let accepted: String = digits
            .iter()
            .take(MAX_DIGITS)
            .map(|d| char::from(b'0' + d))
            .collect();
        let expected: f32 = accepted.parse().unwrap();
        prop_assert_eq!(dialog.handle_key(Key::A), DialogStatus::Saved(expected));
    }

    /// Delete always empties the buffer, however much was typed.
    #[test]
    fn delete_resets_the_entry(digits in prop::collection::vec(0u8..10, 0..8)) {
        let mut dialog = Dialog::new(DialogKind::SetDelay);
        for &d in &digits {
            dialog.handle_key(Key::Digit(d));
        }
        dialog.handle_key(Key::D);
        prop_assert_eq!(dialog.buffer(), "");
    }
}
