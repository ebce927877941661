//! Calibrated weight acquisition over the raw `Scale` trait.

use std::sync::Arc;
use std::time::Duration;

use scalewatch_traits::Scale;

use crate::error::ControlError;
use crate::state::SharedState;

/// Map a boxed scale error to a typed control error, preserving the
/// timeout distinction used by the degraded-mode handling.
pub(crate) fn map_scale_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ControlError::Timeout
    } else {
        ControlError::Sensor(s)
    }
}

/// Windowed averaging plus linearization: weight = (raw − tare) / factor.
///
/// Reads the tare offset and calibration factor from `SharedState` on
/// every call so a tare or calibrate commits take effect on the next
/// sample without restarting the loop.
pub struct SensorReader<S: Scale> {
    scale: S,
    state: Arc<SharedState>,
    timeout: Duration,
}

impl<S: Scale> SensorReader<S> {
    pub fn new(scale: S, state: Arc<SharedState>, timeout: Duration) -> Self {
        Self {
            scale,
            state,
            timeout,
        }
    }

    /// Average `window` raw readings. Used directly for tare.
    pub fn raw_average(&mut self, window: u32) -> Result<i32, ControlError> {
        let window = window.max(1);
        let mut sum: i64 = 0;
        for _ in 0..window {
            let raw = self
                .scale
                .read(self.timeout)
                .map_err(|e| map_scale_error(&*e))?;
            sum += i64::from(raw);
        }
        Ok(div_round_nearest_i64(sum, i64::from(window)))
    }

    /// One calibrated weight sample over the averaging window.
    pub fn sample(&mut self, window: u32) -> Result<f32, ControlError> {
        let avg = self.raw_average(window)?;
        let factor = self.state.calibration_factor();
        if !factor.is_finite() || factor == 0.0 {
            return Err(ControlError::State(format!(
                "calibration factor {factor} is unusable"
            )));
        }
        let delta = avg.saturating_sub(self.state.tare_offset());
        Ok(delta as f32 / factor)
    }
}

#[inline]
fn div_round_nearest_i64(n: i64, d: i64) -> i32 {
    debug_assert!(d > 0);
    let q = if n >= 0 { (n + d / 2) / d } else { (n - d / 2) / d };
    q.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
