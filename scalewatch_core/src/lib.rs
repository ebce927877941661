#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core weight-limit control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `scalewatch_traits` seams
//! (`Scale`, `Actuator`, `Keypad`, `Display`, `ConfigStore`).
//!
//! ## Architecture
//!
//! - **Shared state**: per-field atomic cells with a documented single
//!   writer per field (`state` module)
//! - **Sensing**: windowed raw averaging plus tare/calibration
//!   linearization (`sensor` module)
//! - **Control**: threshold policy with an explicit relay pulse state
//!   machine (`control` module)
//! - **Configuration**: modal numeric-entry dialogs and the commit path
//!   to state + persistent store (`dialog`, `session` modules)
//! - **Persistence**: versioned, checksummed record over a byte store
//!   (`persist` module)
//! - **Orchestration**: control thread + UI thread (`runner` module)

pub mod control;
pub mod dialog;
pub mod error;
pub mod mocks;
pub mod persist;
pub mod runner;
pub mod sensor;
pub mod session;
pub mod state;

pub use control::{ControlCmd, ControlStatus, ControlTask, PulseState};
pub use dialog::{Dialog, DialogKind, DialogStatus};
pub use error::{ControlError, DialogError, StoreError};
pub use persist::PersistedConfig;
pub use sensor::SensorReader;
pub use session::{ConfigSession, Screen, SessionCfg};
pub use state::{Mode, SharedState};
