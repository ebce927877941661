//! Bit-banged HX711 load-cell ADC driver.

use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::poll::wait_until_low;

const DATA_READY_POLL: Duration = Duration::from_micros(200);

pub struct Hx711 {
    dt: InputPin,
    sck: OutputPin,
    // 25, 26 or 27 clock pulses select gain and channel for the next
    // conversion (128/A, 32/B, 64/A).
    gain_pulses: u8,
}

impl Hx711 {
    pub fn new(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        let mut sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        // Clock idles low; high for >60us would power the chip down.
        sck.set_low();
        Ok(Self {
            dt,
            sck,
            gain_pulses,
        })
    }

    /// One conversion: wait for data-ready (DT low), clock out 24 bits
    /// MSB first, then pulse the gain selection for the next read.
    pub fn read_raw(&mut self, timeout: Duration) -> Result<i32> {
        let dt = &self.dt;
        wait_until_low(|| dt.is_high(), timeout, DATA_READY_POLL)?;

        let mut value: i32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay();
            value = (value << 1) | i32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay();
        }

        for _ in 0..self.gain_pulses {
            self.sck.set_high();
            spin_delay();
            self.sck.set_low();
            spin_delay();
        }

        // Sign-extend the 24-bit two's-complement sample.
        if value & 0x80_0000 != 0 {
            value |= !0xFF_FFFF;
        }
        trace!(raw = value, "hx711 conversion");
        Ok(value)
    }
}

#[inline(always)]
fn spin_delay() {
    // HX711 needs >=0.2us between clock edges; a spin hint is plenty.
    std::hint::spin_loop();
}
