//! GPIO-backed actuator and matrix keypad, plus the HX711 scale
//! wrapper with timeout retry.

use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, OutputPin};
use scalewatch_traits::{Actuator, Channel, DynError, Key, KeyEvent, Keypad, Level, Scale};
use tracing::{debug, warn};

use crate::error::{HwError, Result};
use crate::hx711::Hx711;

const READ_RETRIES: u32 = 3;

pub struct HardwareScale {
    hx711: Hx711,
}

impl HardwareScale {
    pub fn new(dt_pin: u8, sck_pin: u8) -> Result<Self> {
        // 25 pulses: channel A, gain 128.
        Ok(Self {
            hx711: Hx711::new(dt_pin, sck_pin, 25)?,
        })
    }
}

impl Scale for HardwareScale {
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, DynError> {
        let mut attempts = 0;
        loop {
            match self.hx711.read_raw(timeout) {
                Ok(raw) => {
                    debug!(raw, "hx711 sample");
                    return Ok(raw);
                }
                Err(HwError::DataReadyTimeout) if attempts < READ_RETRIES => {
                    attempts += 1;
                    warn!(retries = attempts, "hx711 not ready, retrying");
                }
                Err(HwError::DataReadyTimeout) => return Err(Box::new(HwError::Timeout)),
                Err(e) => return Err(Box::new(e)),
            }
        }
    }
}

/// Buzzer and relay on two output pins, both active high.
pub struct GpioActuator {
    buzzer: OutputPin,
    relay: OutputPin,
}

impl GpioActuator {
    pub fn new(buzzer_pin: u8, relay_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut buzzer = gpio
            .get(buzzer_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        let mut relay = gpio
            .get(relay_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        buzzer.set_low();
        relay.set_low();
        Ok(Self { buzzer, relay })
    }
}

impl Actuator for GpioActuator {
    fn set(&mut self, channel: Channel, level: Level) -> std::result::Result<(), DynError> {
        let pin = match channel {
            Channel::Alarm => &mut self.buzzer,
            Channel::Relay => &mut self.relay,
        };
        match level {
            Level::On => pin.set_high(),
            Level::Off => pin.set_low(),
        }
        Ok(())
    }
}

/// 4x4 keypad legend, row-major.
const KEYMAP: [[Key; 4]; 4] = [
    [Key::Digit(1), Key::Digit(2), Key::Digit(3), Key::A],
    [Key::Digit(4), Key::Digit(5), Key::Digit(6), Key::B],
    [Key::Digit(7), Key::Digit(8), Key::Digit(9), Key::C],
    [Key::Star, Key::Digit(0), Key::Hash, Key::D],
];

const HOLD_MS: u64 = 500;

/// Matrix keypad scanned on each poll: rows driven low one at a time,
/// columns read with pullups. A key held past [`HOLD_MS`] reports a
/// hold event while still down; a shorter contact reports a press on
/// release.
pub struct MatrixKeypad {
    rows: Vec<OutputPin>,
    cols: Vec<InputPin>,
    down: Option<Pressed>,
}

struct Pressed {
    key: Key,
    since: Instant,
    hold_sent: bool,
}

impl MatrixKeypad {
    pub fn new(row_pins: &[u8; 4], col_pins: &[u8; 4]) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut rows = Vec::with_capacity(row_pins.len());
        for &pin in row_pins {
            let mut out = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            out.set_high();
            rows.push(out);
        }
        let mut cols = Vec::with_capacity(col_pins.len());
        for &pin in col_pins {
            cols.push(
                gpio.get(pin)
                    .map_err(|e| HwError::Gpio(e.to_string()))?
                    .into_input_pullup(),
            );
        }
        Ok(Self {
            rows,
            cols,
            down: None,
        })
    }

    fn scan(&mut self) -> Option<Key> {
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.set_low();
            let mut hit = None;
            for (c, col) in self.cols.iter().enumerate() {
                if col.is_low() {
                    hit = Some(KEYMAP[r][c]);
                    break;
                }
            }
            row.set_high();
            if hit.is_some() {
                return hit;
            }
        }
        None
    }
}

impl Keypad for MatrixKeypad {
    fn poll(&mut self) -> std::result::Result<Option<KeyEvent>, DynError> {
        let current = self.scan();
        match (&mut self.down, current) {
            (None, None) => Ok(None),
            (None, Some(key)) => {
                self.down = Some(Pressed {
                    key,
                    since: Instant::now(),
                    hold_sent: false,
                });
                Ok(None)
            }
            (Some(p), Some(key)) if p.key == key => {
                if !p.hold_sent && p.since.elapsed() >= Duration::from_millis(HOLD_MS) {
                    p.hold_sent = true;
                    return Ok(Some(KeyEvent::hold(key)));
                }
                Ok(None)
            }
            // Rollover to another key: drop the old contact.
            (Some(_), Some(key)) => {
                self.down = Some(Pressed {
                    key,
                    since: Instant::now(),
                    hold_sent: false,
                });
                Ok(None)
            }
            (Some(p), None) => {
                let ev = if p.hold_sent {
                    None
                } else {
                    Some(KeyEvent::press(p.key))
                };
                self.down = None;
                Ok(ev)
            }
        }
    }
}
