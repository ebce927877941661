//! Test and simulation doubles for scalewatch_core.
//!
//! These are exported (not `cfg(test)`) so integration tests and the
//! CLI self-check can drive the full stack without hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scalewatch_traits::{
    Actuator, Channel, ConfigStore, Display, DynError, Key, KeyEvent, Keypad, Level, Scale,
};

/// Scale that returns a fixed sequence of raw counts, then repeats the
/// last value.
pub struct SeqScale {
    seq: Vec<i32>,
    idx: usize,
}

impl SeqScale {
    pub fn new(seq: impl Into<Vec<i32>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl Scale for SeqScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, DynError> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0)
        };
        Ok(v)
    }
}

/// Scale backed by a shared cell so tests can change the reading while
/// the control task owns the scale.
#[derive(Clone)]
pub struct SharedScale(Arc<Mutex<i32>>);

impl SharedScale {
    pub fn new(initial: i32) -> (Self, Arc<Mutex<i32>>) {
        let cell = Arc::new(Mutex::new(initial));
        (Self(cell.clone()), cell)
    }
}

impl Scale for SharedScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, DynError> {
        Ok(self.0.lock().map(|g| *g).unwrap_or(0))
    }
}

/// Scale that always fails, for degraded-mode tests.
pub struct FailingScale;

impl Scale for FailingScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, DynError> {
        Err(Box::new(std::io::Error::other("sensor timeout")))
    }
}

/// Records every output transition, inspectable from outside the task.
#[derive(Clone, Default)]
pub struct SpyActuator {
    log: Arc<Mutex<Vec<(Channel, Level)>>>,
}

impl SpyActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Vec<(Channel, Level)> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Most recent level commanded on `channel`, if any.
    pub fn last_level(&self, channel: Channel) -> Option<Level> {
        self.log()
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, l)| *l)
    }
}

impl Actuator for SpyActuator {
    fn set(&mut self, channel: Channel, level: Level) -> Result<(), DynError> {
        if let Ok(mut g) = self.log.lock() {
            g.push((channel, level));
        }
        Ok(())
    }
}

/// Keypad that replays a scripted event sequence, then goes quiet.
pub struct ScriptedKeypad {
    events: VecDeque<KeyEvent>,
}

impl ScriptedKeypad {
    pub fn new(events: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, ev: KeyEvent) {
        self.events.push_back(ev);
    }
}

impl Keypad for ScriptedKeypad {
    fn poll(&mut self) -> Result<Option<KeyEvent>, DynError> {
        Ok(self.events.pop_front())
    }
}

/// Convenience for scripting digit entry.
pub fn digit_presses(digits: &[u8]) -> Vec<KeyEvent> {
    digits
        .iter()
        .map(|&d| KeyEvent::press(Key::Digit(d)))
        .collect()
}

/// In-memory store with commit tracking and optional injected failure.
pub struct MemStore {
    bytes: Vec<u8>,
    pub commits: u32,
    pub fail_commit: bool,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MemStore {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0xFF; len],
            commits: 0,
            fail_commit: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn corrupt(&mut self, offset: usize) {
        if let Some(b) = self.bytes.get_mut(offset) {
            *b ^= 0xA5;
        }
    }
}

impl ConfigStore for MemStore {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), DynError> {
        let end = offset + buf.len();
        let src = self
            .bytes
            .get(offset..end)
            .ok_or_else(|| Box::new(std::io::Error::other("read out of bounds")) as DynError)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), DynError> {
        let end = offset + data.len();
        let dst = self
            .bytes
            .get_mut(offset..end)
            .ok_or_else(|| Box::new(std::io::Error::other("write out of bounds")) as DynError)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DynError> {
        if self.fail_commit {
            return Err(Box::new(std::io::Error::other("commit failed")));
        }
        self.commits += 1;
        Ok(())
    }
}

/// Display that records draw calls as plain strings, frame by frame.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Display for RecordingDisplay {
    fn clear(&mut self) -> Result<(), DynError> {
        if let Ok(mut g) = self.lines.lock() {
            g.push("<clear>".to_string());
        }
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, size: u8, text: &str) -> Result<(), DynError> {
        if let Ok(mut g) = self.lines.lock() {
            g.push(format!("{x},{y},{size}:{text}"));
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), DynError> {
        Ok(())
    }
}
