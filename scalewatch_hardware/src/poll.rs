use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait for `is_high` to go false, sleeping `poll_interval` between
/// checks so the data-ready wait does not pin a core.
pub fn wait_until_low(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
