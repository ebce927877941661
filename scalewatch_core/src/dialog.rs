//! Modal numeric-entry dialogs.
//!
//! Each dialog is a small finite state machine polled by the UI loop
//! with one key event at a time; there is no nested blocking input
//! loop. All four operations share the same shape and differ only in
//! their title and in what the session does with the saved value.

use scalewatch_traits::Key;

use crate::error::DialogError;

/// Maximum digits accepted in the entry buffer; further digits are
/// ignored rather than rejected.
pub const MAX_DIGITS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    SetLimit,
    SetDelay,
    Calibrate,
}

impl DialogKind {
    pub fn title(self) -> &'static str {
        match self {
            DialogKind::SetLimit => "SET LIMIT MAX",
            DialogKind::SetDelay => "SET DELAY RELAY",
            DialogKind::Calibrate => "SET CAL FACTOR",
        }
    }
}

/// Result of feeding one key into the dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogStatus {
    /// Still collecting digits.
    Entering,
    /// Save accepted; the parsed value is ready to commit.
    Saved(f32),
    /// Dialog dismissed without committing anything.
    Canceled,
}

#[derive(Debug)]
pub struct Dialog {
    kind: DialogKind,
    buffer: String,
    error: Option<DialogError>,
}

impl Dialog {
    pub fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
            error: None,
        }
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Validation message to re-prompt with, if the last Save was rejected.
    pub fn error(&self) -> Option<&DialogError> {
        self.error.as_ref()
    }

    /// Feed one key. Digits append (up to [`MAX_DIGITS`]), A saves,
    /// D clears the buffer, C cancels; anything else is ignored.
    pub fn handle_key(&mut self, key: Key) -> DialogStatus {
        match key {
            Key::Digit(d) if d <= 9 => {
                if self.buffer.len() < MAX_DIGITS {
                    self.buffer.push((b'0' + d) as char);
                    self.error = None;
                }
                DialogStatus::Entering
            }
            Key::A => match self.parse() {
                Ok(v) => DialogStatus::Saved(v),
                Err(e) => {
                    tracing::debug!(error = %e, kind = ?self.kind, "save rejected");
                    self.error = Some(e);
                    self.buffer.clear();
                    DialogStatus::Entering
                }
            },
            Key::D => {
                self.buffer.clear();
                self.error = None;
                DialogStatus::Entering
            }
            Key::C => DialogStatus::Canceled,
            _ => DialogStatus::Entering,
        }
    }

    fn parse(&self) -> Result<f32, DialogError> {
        if self.buffer.is_empty() {
            return Err(DialogError::EmptyBuffer);
        }
        let v: f32 = self
            .buffer
            .parse()
            .map_err(|_| DialogError::Unparseable(self.buffer.clone()))?;
        if self.kind == DialogKind::Calibrate && v == 0.0 {
            return Err(DialogError::OutOfRange("calibration factor must be non-zero"));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(dialog: &mut Dialog, ds: &[u8]) {
        for &d in ds {
            assert_eq!(dialog.handle_key(Key::Digit(d)), DialogStatus::Entering);
        }
    }

    #[test]
    fn entering_then_saving_parses_the_sequence() {
        let mut d = Dialog::new(DialogKind::SetLimit);
        digits(&mut d, &[2, 5, 0]);
        assert_eq!(d.handle_key(Key::A), DialogStatus::Saved(250.0));
    }

    #[test]
    fn delete_clears_mid_entry() {
        let mut d = Dialog::new(DialogKind::SetLimit);
        digits(&mut d, &[2, 5]);
        d.handle_key(Key::D);
        digits(&mut d, &[7]);
        assert_eq!(d.buffer(), "7");
        assert_eq!(d.handle_key(Key::A), DialogStatus::Saved(7.0));
    }

    #[test]
    fn buffer_caps_at_five_digits() {
        let mut d = Dialog::new(DialogKind::SetDelay);
        digits(&mut d, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(d.buffer(), "12345");
    }

    #[test]
    fn empty_save_is_rejected_and_reprompts() {
        let mut d = Dialog::new(DialogKind::SetLimit);
        assert_eq!(d.handle_key(Key::A), DialogStatus::Entering);
        assert_eq!(d.error(), Some(&crate::error::DialogError::EmptyBuffer));
        // Next digit clears the validation message.
        d.handle_key(Key::Digit(9));
        assert!(d.error().is_none());
        assert_eq!(d.handle_key(Key::A), DialogStatus::Saved(9.0));
    }

    #[test]
    fn cancel_terminates_without_value() {
        let mut d = Dialog::new(DialogKind::Calibrate);
        digits(&mut d, &[4, 2]);
        assert_eq!(d.handle_key(Key::C), DialogStatus::Canceled);
    }

    #[test]
    fn calibrate_rejects_zero() {
        let mut d = Dialog::new(DialogKind::Calibrate);
        digits(&mut d, &[0]);
        assert_eq!(d.handle_key(Key::A), DialogStatus::Entering);
        assert!(matches!(
            d.error(),
            Some(crate::error::DialogError::OutOfRange(_))
        ));
    }
}
