pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Raw load-cell front end. One reading in ADC counts; averaging and
/// calibration live above this trait.
pub trait Scale {
    fn read(&mut self, timeout: Duration) -> Result<i32, DynError>;
}

/// Digital output channels driven by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Primary output, asserted for as long as the threshold is tripped.
    Alarm,
    /// Secondary output, pulsed once per trip after the configured delay.
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    On,
    Off,
}

pub trait Actuator {
    fn set(&mut self, channel: Channel, level: Level) -> Result<(), DynError>;
}

/// Matrix keypad keys. Digits carry their value; the letter/symbol keys
/// are interpreted contextually (hold A = tare, dialog A = save, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Press,
        }
    }
    pub fn hold(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Hold,
        }
    }
}

/// Non-blocking key source. Returns at most one event per poll.
pub trait Keypad {
    fn poll(&mut self) -> Result<Option<KeyEvent>, DynError>;
}

/// Text rendering sink. Every logical screen starts with `clear` and
/// ends with `present` (flush to the physical display).
pub trait Display {
    fn clear(&mut self) -> Result<(), DynError>;
    fn draw_text(&mut self, x: i32, y: i32, size: u8, text: &str) -> Result<(), DynError>;
    fn present(&mut self) -> Result<(), DynError>;
}

/// Byte-addressed non-volatile storage. Writes are durable only after
/// `commit` returns.
pub trait ConfigStore {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), DynError>;
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), DynError>;
    fn commit(&mut self) -> Result<(), DynError>;

    fn read_f32(&mut self, offset: usize) -> Result<f32, DynError> {
        let mut buf = [0u8; 4];
        self.read(offset, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn write_f32(&mut self, offset: usize, value: f32) -> Result<(), DynError> {
        self.write(offset, &value.to_le_bytes())
    }
}
