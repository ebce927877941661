//! Operator configuration session.
//!
//! Owns the non-volatile store and the currently open dialog, and is
//! the single writer for limit, delay, calibration and the readiness
//! flags. Key events arrive one at a time from the UI loop; nothing
//! here blocks the control thread except tare, which deliberately
//! round-trips through it for a quiescent baseline window.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Sender, bounded};
use scalewatch_traits::{ConfigStore, Key, KeyEvent, KeyEventKind};

use crate::control::ControlCmd;
use crate::dialog::{Dialog, DialogKind, DialogStatus};
use crate::persist::{self, PersistedConfig};
use crate::state::{Mode, SharedState};

/// What the UI loop should draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Status or live screen depending on mode; the session has no overlay.
    Normal,
    Dialog {
        title: &'static str,
        buffer: String,
        error: Option<String>,
    },
    /// Confirmation banner, shown until its deadline passes.
    Banner(String),
}

#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// How long confirmation banners stay up (ms).
    pub banner_ms: u64,
    /// Averaging window for the tare baseline.
    pub tare_window: u32,
    /// How long to wait for the control thread to sample the baseline.
    pub tare_timeout: Duration,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            banner_ms: 2000,
            tare_window: 15,
            tare_timeout: Duration::from_secs(5),
        }
    }
}

pub struct ConfigSession<ST: ConfigStore> {
    store: ST,
    state: Arc<SharedState>,
    cmd_tx: Sender<ControlCmd>,
    persisted: PersistedConfig,
    cfg: SessionCfg,
    dialog: Option<Dialog>,
    banner: Option<(String, u64)>,
}

impl<ST: ConfigStore> ConfigSession<ST> {
    pub fn new(
        store: ST,
        state: Arc<SharedState>,
        cmd_tx: Sender<ControlCmd>,
        persisted: PersistedConfig,
        cfg: SessionCfg,
    ) -> Self {
        Self {
            store,
            state,
            cmd_tx,
            persisted,
            cfg,
            dialog: None,
            banner: None,
        }
    }

    pub fn persisted(&self) -> &PersistedConfig {
        &self.persisted
    }

    pub fn store(&self) -> &ST {
        &self.store
    }

    pub fn dialog_active(&self) -> bool {
        self.dialog.is_some()
    }

    /// Feed one key event. `now_ms` is milliseconds since the UI epoch.
    pub fn on_key(&mut self, ev: KeyEvent, now_ms: u64) {
        // Banner frames swallow input, matching the modal confirmation
        // delay of the keypad firmware this replaces.
        if self.banner_active(now_ms) {
            return;
        }

        if let Some(dialog) = self.dialog.as_mut() {
            match dialog.handle_key(ev.key) {
                DialogStatus::Entering => {}
                DialogStatus::Saved(value) => {
                    let kind = dialog.kind();
                    self.dialog = None;
                    self.commit(kind, value, now_ms);
                }
                DialogStatus::Canceled => {
                    self.dialog = None;
                    self.show_banner("CANCELED!", now_ms);
                }
            }
            return;
        }

        match (ev.kind, ev.key) {
            (KeyEventKind::Hold, Key::A) => self.tare(now_ms),
            (KeyEventKind::Hold, Key::B) => {
                self.state.set_mode(Mode::Running);
                tracing::info!("control mode: running");
            }
            (KeyEventKind::Hold, Key::C) => self.dialog = Some(Dialog::new(DialogKind::SetLimit)),
            (KeyEventKind::Hold, Key::D) => self.dialog = Some(Dialog::new(DialogKind::SetDelay)),
            (KeyEventKind::Hold, Key::Hash) => {
                self.dialog = Some(Dialog::new(DialogKind::Calibrate));
            }
            (KeyEventKind::Press, Key::Star) => {
                self.state.set_mode(Mode::Idle);
                tracing::info!("control mode: idle");
            }
            _ => {}
        }
    }

    /// What to render at `now_ms`; expires the banner as a side effect.
    pub fn screen(&mut self, now_ms: u64) -> Screen {
        if let Some((text, until)) = &self.banner {
            if now_ms < *until {
                return Screen::Banner(text.clone());
            }
            self.banner = None;
        }
        if let Some(d) = &self.dialog {
            return Screen::Dialog {
                title: d.kind().title(),
                buffer: d.buffer().to_string(),
                error: d.error().map(|e| e.to_string()),
            };
        }
        Screen::Normal
    }

    fn banner_active(&self, now_ms: u64) -> bool {
        matches!(&self.banner, Some((_, until)) if now_ms < *until)
    }

    fn show_banner(&mut self, text: &str, now_ms: u64) {
        self.banner = Some((text.to_string(), now_ms + self.cfg.banner_ms));
    }

    /// One-shot tare: ask the control thread for a quiescent raw
    /// baseline, then take ownership of the offset and readiness flag.
    fn tare(&mut self, now_ms: u64) {
        let (reply_tx, reply_rx) = bounded(1);
        let sent = self.cmd_tx.send(ControlCmd::Tare {
            window: self.cfg.tare_window,
            reply: reply_tx,
        });
        if sent.is_err() {
            tracing::error!("control thread gone; tare not possible");
            self.show_banner("TARE FAILED", now_ms);
            return;
        }
        match reply_rx.recv_timeout(self.cfg.tare_timeout) {
            Ok(Ok(raw)) => {
                self.state.set_tare_offset(raw);
                self.state.set_tare_done(true);
                tracing::info!(raw, "tare offset committed");
                self.show_banner("Tare Done!", now_ms);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "tare sampling failed");
                self.show_banner("TARE FAILED", now_ms);
            }
            Err(_) => {
                tracing::warn!("tare reply timed out");
                self.show_banner("TARE FAILED", now_ms);
            }
        }
    }

    fn commit(&mut self, kind: DialogKind, value: f32, now_ms: u64) {
        match kind {
            DialogKind::SetLimit => {
                self.state.set_limit_g(value);
                self.persisted.limit_g = value;
            }
            DialogKind::SetDelay => {
                let ms = value as u32;
                self.state.set_actuator_delay_ms(ms);
                self.persisted.actuator_delay_ms = ms;
            }
            DialogKind::Calibrate => {
                self.state.set_calibration_factor(value);
                self.persisted.calibration_factor = value;
            }
        }
        match persist::save(&mut self.store, &self.persisted) {
            Ok(()) => {
                if kind == DialogKind::Calibrate {
                    self.state.set_calibration_done(true);
                }
                tracing::info!(?kind, value, "configuration saved");
                self.show_banner("SAVED!", now_ms);
            }
            Err(e) => {
                // Keep the in-memory value; readiness stays unset so the
                // operator can see the save did not stick.
                tracing::warn!(error = %e, ?kind, "persist failed; value kept in memory only");
                self.show_banner("NOT SAVED!", now_ms);
            }
        }
    }
}
