use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::bounded;
use scalewatch_core::mocks::{MemStore, digit_presses};
use scalewatch_core::persist::{PersistedConfig, RECORD_LEN, RECORD_OFFSET};
use scalewatch_core::{ConfigSession, ControlCmd, Mode, Screen, SessionCfg, SharedState};
use scalewatch_traits::{Key, KeyEvent};

fn new_session(
    store: MemStore,
) -> (
    ConfigSession<MemStore>,
    Arc<SharedState>,
    crossbeam_channel::Receiver<ControlCmd>,
) {
    let state = Arc::new(SharedState::new(5005.0, 0.0, 0));
    let (tx, rx) = bounded(4);
    let persisted = PersistedConfig {
        calibration_factor: 5005.0,
        limit_g: 0.0,
        actuator_delay_ms: 0,
    };
    let session = ConfigSession::new(store, state.clone(), tx, persisted, SessionCfg::default());
    (session, state, rx)
}

fn stored_record(session: &ConfigSession<MemStore>) -> PersistedConfig {
    let bytes = session.store().bytes();
    PersistedConfig::decode(&bytes[RECORD_OFFSET..RECORD_OFFSET + RECORD_LEN]).unwrap()
}

#[test]
fn set_limit_dialog_commits_to_state_and_store() {
    let (mut session, state, _rx) = new_session(MemStore::default());

    session.on_key(KeyEvent::hold(Key::C), 0);
    assert!(session.dialog_active());
    for ev in digit_presses(&[2, 5, 0]) {
        session.on_key(ev, 0);
    }
    assert_eq!(
        session.screen(0),
        Screen::Dialog {
            title: "SET LIMIT MAX",
            buffer: "250".into(),
            error: None,
        }
    );

    session.on_key(KeyEvent::press(Key::A), 0);
    assert!(!session.dialog_active());
    assert_eq!(state.limit_g(), 250.0);
    assert_eq!(session.persisted().limit_g, 250.0);
    assert_eq!(stored_record(&session).limit_g, 250.0);
    assert_eq!(session.store().commits, 1);
    assert_eq!(session.screen(0), Screen::Banner("SAVED!".into()));
    // The banner goes away on its own.
    assert_eq!(session.screen(2000), Screen::Normal);
}

#[test]
fn cancel_leaves_state_and_store_untouched() {
    let (mut session, state, _rx) = new_session(MemStore::default());

    session.on_key(KeyEvent::hold(Key::D), 0);
    for ev in digit_presses(&[9, 9]) {
        session.on_key(ev, 0);
    }
    session.on_key(KeyEvent::press(Key::C), 0);

    assert!(!session.dialog_active());
    assert_eq!(state.actuator_delay_ms(), 0);
    assert_eq!(session.store().commits, 0);
    // The untouched image still holds no valid record.
    assert!(
        PersistedConfig::decode(&session.store().bytes()[RECORD_OFFSET..RECORD_OFFSET + RECORD_LEN])
            .is_err()
    );
    assert_eq!(session.screen(0), Screen::Banner("CANCELED!".into()));
}

#[test]
fn saving_the_same_value_twice_is_idempotent() {
    let (mut session, state, _rx) = new_session(MemStore::default());

    for t in [0u64, 5000] {
        session.on_key(KeyEvent::hold(Key::C), t);
        for ev in digit_presses(&[4, 2]) {
            session.on_key(ev, t);
        }
        session.on_key(KeyEvent::press(Key::A), t);
    }

    assert_eq!(state.limit_g(), 42.0);
    assert_eq!(stored_record(&session).limit_g, 42.0);
    assert_eq!(session.store().commits, 2);
}

#[test]
fn calibration_save_sets_readiness_flag() {
    let (mut session, state, _rx) = new_session(MemStore::default());
    assert!(!state.calibration_done());

    session.on_key(KeyEvent::hold(Key::Hash), 0);
    for ev in digit_presses(&[4, 8, 0, 0]) {
        session.on_key(ev, 0);
    }
    session.on_key(KeyEvent::press(Key::A), 0);

    assert!(state.calibration_done());
    assert_eq!(state.calibration_factor(), 4800.0);
    assert_eq!(stored_record(&session).calibration_factor, 4800.0);
}

#[test]
fn failed_commit_keeps_value_in_memory_only() {
    let mut store = MemStore::default();
    store.fail_commit = true;
    let (mut session, state, _rx) = new_session(store);

    session.on_key(KeyEvent::hold(Key::Hash), 0);
    for ev in digit_presses(&[6, 0, 0, 0]) {
        session.on_key(ev, 0);
    }
    session.on_key(KeyEvent::press(Key::A), 0);

    // Value takes effect for this power cycle, but readiness is not
    // claimed and the operator is told the save did not stick.
    assert_eq!(state.calibration_factor(), 6000.0);
    assert!(!state.calibration_done());
    assert_eq!(session.store().commits, 0);
    assert_eq!(session.screen(0), Screen::Banner("NOT SAVED!".into()));
}

#[test]
fn empty_save_reprompts_without_committing() {
    let (mut session, state, _rx) = new_session(MemStore::default());

    session.on_key(KeyEvent::hold(Key::C), 0);
    session.on_key(KeyEvent::press(Key::A), 0);

    assert!(session.dialog_active());
    match session.screen(0) {
        Screen::Dialog { buffer, error, .. } => {
            assert_eq!(buffer, "");
            assert!(error.is_some());
        }
        other => panic!("expected dialog, got {other:?}"),
    }
    assert_eq!(state.limit_g(), 0.0);
    assert_eq!(session.store().commits, 0);
}

#[test]
fn banner_swallows_keys_until_it_expires() {
    let (mut session, state, _rx) = new_session(MemStore::default());

    session.on_key(KeyEvent::hold(Key::C), 0);
    for ev in digit_presses(&[1]) {
        session.on_key(ev, 0);
    }
    session.on_key(KeyEvent::press(Key::A), 0);
    assert!(matches!(session.screen(100), Screen::Banner(_)));

    // Start is ignored while the banner is up...
    session.on_key(KeyEvent::hold(Key::B), 100);
    assert_eq!(state.mode(), Mode::Idle);

    // ...and honored once it has expired.
    session.on_key(KeyEvent::hold(Key::B), 2500);
    assert_eq!(state.mode(), Mode::Running);
}

#[test]
fn start_and_stop_switch_mode() {
    let (mut session, state, _rx) = new_session(MemStore::default());
    assert_eq!(state.mode(), Mode::Idle);

    session.on_key(KeyEvent::hold(Key::B), 0);
    assert_eq!(state.mode(), Mode::Running);

    session.on_key(KeyEvent::press(Key::Star), 0);
    assert_eq!(state.mode(), Mode::Idle);
}

#[test]
fn tare_round_trips_through_the_control_channel() {
    let (mut session, state, rx) = new_session(MemStore::default());

    // Stand in for the control thread servicing the command queue.
    let servicer = std::thread::spawn(move || match rx.recv_timeout(Duration::from_secs(2)) {
        Ok(ControlCmd::Tare { window, reply }) => {
            assert_eq!(window, 15);
            reply.send(Ok(1234)).unwrap();
        }
        Err(e) => panic!("no tare command arrived: {e}"),
    });

    session.on_key(KeyEvent::hold(Key::A), 0);
    servicer.join().unwrap();

    assert_eq!(state.tare_offset(), 1234);
    assert!(state.tare_done());
    assert_eq!(session.screen(0), Screen::Banner("Tare Done!".into()));
}

#[test]
fn tare_failure_reports_without_setting_readiness() {
    let (mut session, state, rx) = new_session(MemStore::default());

    // Drop the receiver so the session sees a dead control thread.
    drop(rx);
    session.on_key(KeyEvent::hold(Key::A), 0);

    assert!(!state.tare_done());
    assert_eq!(session.screen(0), Screen::Banner("TARE FAILED".into()));
}
