//! Threshold-actuation control task.
//!
//! One `step()` per control period: sample the sensor, publish the
//! weight, evaluate the threshold policy, and advance the relay pulse
//! state machine. The pulse phases are explicit (`Idle`, `Triggering`,
//! `Cooling`) so "no overlapping pulses" holds by construction instead
//! of relying on the task being blocked mid-sequence.
//!
//! Actuation gates on `Mode::Running`; the Stop key silences the alarm
//! by flipping the mode, while a relay pulse already in flight always
//! runs to completion.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use scalewatch_traits::{Actuator, Channel, Clock, Level, Scale};

use crate::error::ControlError;
use crate::sensor::SensorReader;
use crate::state::{Mode, SharedState};

/// Commands served between regular steps. Tare executes on the control
/// thread so the sensor stays quiescent for the whole baseline window.
pub enum ControlCmd {
    Tare {
        window: u32,
        reply: Sender<Result<i32, ControlError>>,
    },
}

/// Relay pulse phases. Deadlines are milliseconds since the task epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseState {
    Idle,
    /// Alarm tripped; relay asserts once the configured delay elapses.
    Triggering { relay_on_at_ms: u64 },
    /// Relay asserted; deasserts when the fixed pulse width elapses.
    Cooling { relay_off_at_ms: u64 },
}

/// Outcome of one control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    Nominal,
    /// Sensor read failed; outputs were made safe and the last good
    /// weight was kept.
    Degraded,
}

#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Averaging window per weight sample.
    pub sample_window: u32,
    /// Relay pulse width in milliseconds.
    pub pulse_ms: u64,
    /// Consecutive sensor failures before the loop aborts.
    pub fault_limit: u32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            sample_window: 4,
            pulse_ms: 350,
            fault_limit: 10,
        }
    }
}

pub struct ControlTask<S: Scale, A: Actuator> {
    reader: SensorReader<S>,
    actuator: A,
    state: Arc<SharedState>,
    cfg: ControlCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    pulse: PulseState,
    alarm_on: bool,
    consecutive_failures: u32,
    cmd_rx: Receiver<ControlCmd>,
}

impl<S: Scale, A: Actuator> ControlTask<S, A> {
    pub fn new(
        scale: S,
        actuator: A,
        state: Arc<SharedState>,
        cfg: ControlCfg,
        sensor_timeout: std::time::Duration,
        clock: Arc<dyn Clock + Send + Sync>,
        cmd_rx: Receiver<ControlCmd>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            reader: SensorReader::new(scale, state.clone(), sensor_timeout),
            actuator,
            state,
            cfg,
            clock,
            epoch,
            pulse: PulseState::Idle,
            alarm_on: false,
            consecutive_failures: 0,
            cmd_rx,
        }
    }

    pub fn pulse_state(&self) -> PulseState {
        self.pulse
    }

    /// One control period. Returns Err only for unrecoverable faults
    /// (actuator failure, persistent sensor fault).
    pub fn step(&mut self) -> Result<ControlStatus, ControlError> {
        // Serve tare requests before sampling so the baseline window is
        // not interleaved with threshold reads.
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            self.handle_cmd(cmd);
        }

        let now = self.clock.ms_since(self.epoch);

        match self.reader.sample(self.cfg.sample_window) {
            Ok(w) => {
                self.state.set_weight_g(w);
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "sensor read failed; keeping last weight"
                );
                if self.consecutive_failures >= self.cfg.fault_limit {
                    self.make_safe();
                    return Err(ControlError::SensorFault(self.consecutive_failures));
                }
                self.set_alarm(false)?;
                self.advance_pulse(now)?;
                return Ok(ControlStatus::Degraded);
            }
        }

        let tripped = self.state.mode() == Mode::Running
            && self.state.weight_g() >= self.state.limit_g();
        if tripped {
            self.set_alarm(true)?;
            if self.pulse == PulseState::Idle {
                let delay = u64::from(self.state.actuator_delay_ms());
                self.pulse = PulseState::Triggering {
                    relay_on_at_ms: now + delay,
                };
                tracing::debug!(
                    weight_g = self.state.weight_g(),
                    limit_g = self.state.limit_g(),
                    delay_ms = delay,
                    "threshold tripped, pulse armed"
                );
            }
        } else {
            self.set_alarm(false)?;
        }

        self.advance_pulse(now)?;
        Ok(ControlStatus::Nominal)
    }

    fn handle_cmd(&mut self, cmd: ControlCmd) {
        match cmd {
            ControlCmd::Tare { window, reply } => {
                // Quiet platform for the baseline: outputs off, any
                // pulse in flight cancelled.
                self.make_safe();
                let res = self.reader.raw_average(window);
                if let Ok(raw) = &res {
                    tracing::info!(raw, window, "tare baseline sampled");
                }
                // Receiver gone means the session timed out; nothing to do.
                let _ = reply.send(res);
            }
        }
    }

    fn advance_pulse(&mut self, now: u64) -> Result<(), ControlError> {
        match self.pulse {
            PulseState::Triggering { relay_on_at_ms } if now >= relay_on_at_ms => {
                self.set_relay(true)?;
                self.pulse = PulseState::Cooling {
                    relay_off_at_ms: now + self.cfg.pulse_ms,
                };
                tracing::debug!(pulse_ms = self.cfg.pulse_ms, "relay asserted");
            }
            PulseState::Cooling { relay_off_at_ms } if now >= relay_off_at_ms => {
                self.set_relay(false)?;
                self.pulse = PulseState::Idle;
                tracing::debug!("relay pulse complete");
            }
            _ => {}
        }
        Ok(())
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), ControlError> {
        if self.alarm_on == on {
            return Ok(());
        }
        let level = if on { Level::On } else { Level::Off };
        self.actuator
            .set(Channel::Alarm, level)
            .map_err(|e| ControlError::Actuator(e.to_string()))?;
        self.alarm_on = on;
        Ok(())
    }

    fn set_relay(&mut self, on: bool) -> Result<(), ControlError> {
        let level = if on { Level::On } else { Level::Off };
        self.actuator
            .set(Channel::Relay, level)
            .map_err(|e| ControlError::Actuator(e.to_string()))
    }

    /// Best-effort deassert of both outputs; used on the abort path.
    pub fn make_safe(&mut self) {
        if let Err(e) = self.actuator.set(Channel::Alarm, Level::Off) {
            tracing::warn!(error = %e, "failed to deassert alarm during shutdown");
        }
        if let Err(e) = self.actuator.set(Channel::Relay, Level::Off) {
            tracing::warn!(error = %e, "failed to deassert relay during shutdown");
        }
        self.alarm_on = false;
        self.pulse = PulseState::Idle;
    }
}
