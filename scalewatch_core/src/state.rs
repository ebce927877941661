//! Cross-task shared control state.
//!
//! Each field is an atomic cell with a single documented writer:
//!
//! | field                | writer                      | readers        |
//! |----------------------|-----------------------------|----------------|
//! | weight_g             | control task                | UI task        |
//! | limit_g              | config session              | control task   |
//! | actuator_delay_ms    | config session              | control task   |
//! | mode                 | key dispatch (UI task)      | both           |
//! | tare_offset          | config session (tare)       | control task   |
//! | calibration_factor   | config session (calibrate)  | control task   |
//! | tare_done, cal_done  | config session              | UI task        |
//!
//! Stores use Release and loads use Acquire so a reader that observes a
//! new value also observes everything written before it. Fields are
//! single-word scalars; there are no composite commits that would need
//! a lock.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Idle = 0,
    Running = 1,
}

impl Mode {
    fn from_u8(v: u8) -> Self {
        if v == Mode::Running as u8 {
            Mode::Running
        } else {
            Mode::Idle
        }
    }
}

#[derive(Debug)]
pub struct SharedState {
    weight_bits: AtomicU32,
    limit_bits: AtomicU32,
    actuator_delay_ms: AtomicU32,
    mode: AtomicU8,
    tare_offset: AtomicI32,
    calibration_bits: AtomicU32,
    tare_done: AtomicBool,
    calibration_done: AtomicBool,
}

impl SharedState {
    pub fn new(calibration_factor: f32, limit_g: f32, actuator_delay_ms: u32) -> Self {
        Self {
            weight_bits: AtomicU32::new(0f32.to_bits()),
            limit_bits: AtomicU32::new(limit_g.to_bits()),
            actuator_delay_ms: AtomicU32::new(actuator_delay_ms),
            mode: AtomicU8::new(Mode::Idle as u8),
            tare_offset: AtomicI32::new(0),
            calibration_bits: AtomicU32::new(calibration_factor.to_bits()),
            tare_done: AtomicBool::new(false),
            calibration_done: AtomicBool::new(false),
        }
    }

    pub fn weight_g(&self) -> f32 {
        f32::from_bits(self.weight_bits.load(Ordering::Acquire))
    }
    /// Written only by the control task.
    pub fn set_weight_g(&self, w: f32) {
        self.weight_bits.store(w.to_bits(), Ordering::Release);
    }

    pub fn limit_g(&self) -> f32 {
        f32::from_bits(self.limit_bits.load(Ordering::Acquire))
    }
    /// Written only by the config session.
    pub fn set_limit_g(&self, limit: f32) {
        self.limit_bits.store(limit.to_bits(), Ordering::Release);
    }

    pub fn actuator_delay_ms(&self) -> u32 {
        self.actuator_delay_ms.load(Ordering::Acquire)
    }
    /// Written only by the config session.
    pub fn set_actuator_delay_ms(&self, ms: u32) {
        self.actuator_delay_ms.store(ms, Ordering::Release);
    }

    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }
    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    pub fn tare_offset(&self) -> i32 {
        self.tare_offset.load(Ordering::Acquire)
    }
    pub fn set_tare_offset(&self, raw: i32) {
        self.tare_offset.store(raw, Ordering::Release);
    }

    pub fn calibration_factor(&self) -> f32 {
        f32::from_bits(self.calibration_bits.load(Ordering::Acquire))
    }
    pub fn set_calibration_factor(&self, factor: f32) {
        self.calibration_bits
            .store(factor.to_bits(), Ordering::Release);
    }

    pub fn tare_done(&self) -> bool {
        self.tare_done.load(Ordering::Acquire)
    }
    pub fn set_tare_done(&self, done: bool) {
        self.tare_done.store(done, Ordering::Release);
    }

    pub fn calibration_done(&self) -> bool {
        self.calibration_done.load(Ordering::Acquire)
    }
    pub fn set_calibration_done(&self, done: bool) {
        self.calibration_done.store(done, Ordering::Release);
    }
}
