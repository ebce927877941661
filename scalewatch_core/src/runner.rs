//! Two-task orchestration: control thread + UI loop.
//!
//! The control task runs on its own thread and owns the scale and the
//! actuator. The calling thread runs the UI loop, which owns the
//! keypad, the display and the config session; keypad events are
//! dispatched inside that loop. Shutdown is a shared flag checked once
//! per iteration on both sides, and the control thread is always
//! joined before `run` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::bounded;
use eyre::WrapErr;
use scalewatch_traits::{Actuator, Clock, ConfigStore, Display, Keypad, Scale};
use scalewatch_ui::StatusView;

use crate::control::{ControlCfg, ControlTask};
use crate::error::{ControlError, Result};
use crate::persist::PersistedConfig;
use crate::session::{ConfigSession, Screen, SessionCfg};
use crate::state::{Mode, SharedState};

#[derive(Debug, Clone)]
pub struct RunnerParams {
    pub control_period: Duration,
    pub ui_period: Duration,
    pub sensor_timeout: Duration,
    pub control: ControlCfg,
    pub session: SessionCfg,
}

impl Default for RunnerParams {
    fn default() -> Self {
        Self {
            control_period: Duration::from_millis(70),
            ui_period: Duration::from_millis(300),
            sensor_timeout: Duration::from_millis(150),
            control: ControlCfg::default(),
            session: SessionCfg::default(),
        }
    }
}

impl RunnerParams {
    pub fn from_config(cfg: &scalewatch_config::Config) -> Self {
        Self {
            control_period: Duration::from_millis(cfg.timing.control_period_ms),
            ui_period: Duration::from_millis(cfg.timing.ui_period_ms),
            sensor_timeout: Duration::from_millis(cfg.hardware.sensor_read_timeout_ms),
            control: ControlCfg {
                sample_window: cfg.sampling.sample_window,
                pulse_ms: cfg.timing.pulse_ms,
                fault_limit: cfg.sampling.fault_limit,
            },
            session: SessionCfg {
                banner_ms: cfg.timing.banner_ms,
                tare_window: cfg.sampling.tare_window,
                ..SessionCfg::default()
            },
        }
    }
}

/// Run both tasks until `shutdown` is set or a fatal error occurs.
#[allow(clippy::too_many_arguments)]
pub fn run<S, A, K, D, ST>(
    scale: S,
    actuator: A,
    mut keypad: K,
    mut display: D,
    store: ST,
    state: Arc<SharedState>,
    persisted: PersistedConfig,
    params: RunnerParams,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
) -> Result<()>
where
    S: Scale + Send + 'static,
    A: Actuator + Send + 'static,
    K: Keypad,
    D: Display,
    ST: ConfigStore,
{
    let (cmd_tx, cmd_rx) = bounded(4);
    let mut control = ControlTask::new(
        scale,
        actuator,
        state.clone(),
        params.control.clone(),
        params.sensor_timeout,
        clock.clone(),
        cmd_rx,
    );

    let control_shutdown = shutdown.clone();
    let control_clock = clock.clone();
    let control_period = params.control_period;
    let handle = std::thread::Builder::new()
        .name("control".to_string())
        .spawn(move || -> std::result::Result<(), ControlError> {
            let mut outcome = Ok(());
            while !control_shutdown.load(Ordering::Relaxed) {
                if let Err(e) = control.step() {
                    tracing::error!(error = %e, "control loop aborted");
                    control_shutdown.store(true, Ordering::Release);
                    outcome = Err(e);
                    break;
                }
                control_clock.sleep(control_period);
            }
            control.make_safe();
            tracing::debug!("control thread exiting");
            outcome
        })
        .wrap_err("spawn control thread")?;

    let mut session = ConfigSession::new(store, state.clone(), cmd_tx, persisted, params.session);
    let ui_result = ui_loop(
        &mut keypad,
        &mut display,
        &mut session,
        &state,
        clock.as_ref(),
        params.ui_period,
        &shutdown,
    );

    shutdown.store(true, Ordering::Release);
    let control_result = match handle.join() {
        Ok(outcome) => outcome
            .map_err(eyre::Report::new)
            .wrap_err("control task failed"),
        Err(e) => {
            tracing::error!(?e, "control thread panicked");
            Err(eyre::eyre!("control thread panicked"))
        }
    };
    control_result.and(ui_result)
}

fn ui_loop<K: Keypad, D: Display, ST: ConfigStore>(
    keypad: &mut K,
    display: &mut D,
    session: &mut ConfigSession<ST>,
    state: &SharedState,
    clock: &(dyn Clock + Send + Sync),
    period: Duration,
    shutdown: &AtomicBool,
) -> Result<()> {
    let epoch = clock.now();
    while !shutdown.load(Ordering::Relaxed) {
        let now_ms = clock.ms_since(epoch);
        match keypad.poll() {
            Ok(Some(ev)) => session.on_key(ev, now_ms),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "keypad poll failed"),
        }

        render(display, session, state, clock.ms_since(epoch))
            .map_err(|e| eyre::Report::new(ControlError::Display(e.to_string())))
            .wrap_err("ui render")?;

        clock.sleep(period);
    }
    Ok(())
}

fn render<D: Display, ST: ConfigStore>(
    display: &mut D,
    session: &mut ConfigSession<ST>,
    state: &SharedState,
    now_ms: u64,
) -> std::result::Result<(), scalewatch_traits::DynError> {
    match session.screen(now_ms) {
        Screen::Banner(text) => scalewatch_ui::banner(display, &text),
        Screen::Dialog {
            title,
            buffer,
            error,
        } => scalewatch_ui::dialog(display, title, &buffer, error.as_deref()),
        Screen::Normal => {
            if state.mode() == Mode::Running {
                scalewatch_ui::live(display, state.weight_g())
            } else {
                scalewatch_ui::status(
                    display,
                    &StatusView {
                        tare_done: state.tare_done(),
                        calibration_done: state.calibration_done(),
                        limit_g: state.limit_g(),
                    },
                )
            }
        }
    }
}
