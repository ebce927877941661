//! Hardware backends for the scalewatch traits.
//!
//! Simulated implementations are always available and are what the CLI
//! uses off-target. The `hardware` feature adds the real GPIO backends
//! (HX711 scale, buzzer/relay pins, matrix keypad) via `rppal`.

pub mod error;
pub mod poll;
pub mod store;

#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod hx711;

use std::io::BufRead;

use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use scalewatch_traits::{Actuator, Channel, DynError, Key, KeyEvent, Keypad, Level, Scale};
use tracing::{debug, info, warn};

pub use error::HwError;
pub use store::FileStore;

/// Scale that ramps its raw reading, as if weight were being piled on
/// the platform.
pub struct SimulatedScale {
    raw: i32,
    step: i32,
    max: i32,
}

impl SimulatedScale {
    pub fn new(step: i32, max: i32) -> Self {
        Self { raw: 0, step, max }
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, DynError> {
        let raw = self.raw;
        self.raw = (self.raw + self.step).min(self.max);
        debug!(raw, "simulated scale sample");
        Ok(raw)
    }
}

/// Actuator that just logs channel transitions.
#[derive(Default)]
pub struct SimulatedActuator;

impl Actuator for SimulatedActuator {
    fn set(&mut self, channel: Channel, level: Level) -> Result<(), DynError> {
        info!(?channel, ?level, "simulated actuator");
        Ok(())
    }
}

/// Keypad fed from stdin, one whitespace-separated token per key.
///
/// A token is the key itself for a press (`5`, `*`, `A`) or the key
/// prefixed with `!` for a hold (`!A` tares, `!B` starts).
pub struct SimulatedKeypad {
    rx: Receiver<KeyEvent>,
}

impl SimulatedKeypad {
    pub fn from_stdin() -> Self {
        let (tx, rx) = unbounded();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for token in line.split_whitespace() {
                    match parse_key_token(token) {
                        Some(ev) => {
                            if tx.send(ev).is_err() {
                                return;
                            }
                        }
                        None => warn!(token, "unrecognized key token"),
                    }
                }
            }
        });
        Self { rx }
    }
}

impl Keypad for SimulatedKeypad {
    fn poll(&mut self) -> Result<Option<KeyEvent>, DynError> {
        match self.rx.try_recv() {
            Ok(ev) => Ok(Some(ev)),
            // Disconnected just means stdin closed; keep running.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Ok(None),
        }
    }
}

fn parse_key_token(token: &str) -> Option<KeyEvent> {
    let (hold, key_str) = match token.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let mut chars = key_str.chars();
    let (c, rest) = (chars.next()?, chars.next());
    if rest.is_some() {
        return None;
    }
    let key = match c.to_ascii_uppercase() {
        'A' => Key::A,
        'B' => Key::B,
        'C' => Key::C,
        'D' => Key::D,
        '*' => Key::Star,
        '#' => Key::Hash,
        d @ '0'..='9' => Key::Digit(d as u8 - b'0'),
        _ => return None,
    };
    Some(if hold {
        KeyEvent::hold(key)
    } else {
        KeyEvent::press(key)
    })
}

/// Console display: buffers draw calls and prints the frame on
/// `present`, skipping frames identical to the previous one.
#[derive(Default)]
pub struct ConsoleDisplay {
    pending: Vec<String>,
    last: Vec<String>,
}

impl scalewatch_traits::Display for ConsoleDisplay {
    fn clear(&mut self) -> Result<(), DynError> {
        self.pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, _x: i32, _y: i32, _size: u8, text: &str) -> Result<(), DynError> {
        self.pending.push(text.to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<(), DynError> {
        if self.pending != self.last {
            println!("+----------------------+");
            for line in &self.pending {
                println!("| {line}");
            }
            println!("+----------------------+");
            self.last = self.pending.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn simulated_scale_ramps_and_saturates() {
        let mut scale = SimulatedScale::new(100, 250);
        let t = std::time::Duration::from_millis(10);
        assert_eq!(scale.read(t).unwrap(), 0);
        assert_eq!(scale.read(t).unwrap(), 100);
        assert_eq!(scale.read(t).unwrap(), 200);
        assert_eq!(scale.read(t).unwrap(), 250);
        assert_eq!(scale.read(t).unwrap(), 250);
    }

    #[rstest]
    #[case("5", KeyEvent::press(Key::Digit(5)))]
    #[case("*", KeyEvent::press(Key::Star))]
    #[case("!A", KeyEvent::hold(Key::A))]
    #[case("!b", KeyEvent::hold(Key::B))]
    #[case("!#", KeyEvent::hold(Key::Hash))]
    fn key_tokens_parse(#[case] token: &str, #[case] expected: KeyEvent) {
        assert_eq!(parse_key_token(token), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("AB")]
    #[case("x")]
    #[case("!")]
    fn bad_key_tokens_are_rejected(#[case] token: &str) {
        assert_eq!(parse_key_token(token), None);
    }
}
