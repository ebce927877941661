#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Screen layouts for the 128x64 operator display.
//!
//! Pure rendering over the `Display` trait: every screen clears the
//! previous frame, draws its text and flushes, so frames never bleed
//! into each other. Coordinates target the stock 128x64 OLED layout.

use scalewatch_traits::{Display, DynError};

/// Data for the idle/status screen.
#[derive(Debug, Clone, Copy)]
pub struct StatusView {
    pub tare_done: bool,
    pub calibration_done: bool,
    pub limit_g: f32,
}

fn done_label(done: bool) -> &'static str {
    if done { "OK" } else { "Not OK" }
}

/// Main menu: readiness flags, configured limit, hold-key legend.
pub fn status<D: Display + ?Sized>(d: &mut D, view: &StatusView) -> Result<(), DynError> {
    d.clear()?;
    d.draw_text(38, 0, 1, "MAIN MENU")?;
    d.draw_text(30, 19, 1, &format!("Tare : {}", done_label(view.tare_done)))?;
    d.draw_text(
        30,
        29,
        1,
        &format!("Cal  : {}", done_label(view.calibration_done)),
    )?;
    d.draw_text(25, 39, 1, &format!("Limit : {:.2}Kg", view.limit_g))?;
    d.draw_text(17, 49, 1, "A.Tare  B.Start")?;
    d.draw_text(17, 57, 1, "C.Limit D.Delay #.Cal")?;
    d.present()
}

/// Running screen: large numeric readout plus unit label.
pub fn live<D: Display + ?Sized>(d: &mut D, weight_g: f32) -> Result<(), DynError> {
    d.clear()?;
    d.draw_text(10, 0, 1, "CALCULATING WEIGHT")?;
    d.draw_text(25, 20, 3, &format!("{weight_g:.2}"))?;
    d.draw_text(55, 55, 1, "Kg")?;
    d.present()
}

/// Numeric-entry dialog: title, current buffer, key legend, and an
/// optional validation message after a rejected save.
pub fn dialog<D: Display + ?Sized>(
    d: &mut D,
    title: &str,
    buffer: &str,
    error: Option<&str>,
) -> Result<(), DynError> {
    d.clear()?;
    d.draw_text(22, 0, 1, title)?;
    d.draw_text(29, 25, 2, buffer)?;
    if let Some(msg) = error {
        d.draw_text(10, 45, 1, msg)?;
    }
    d.draw_text(0, 55, 1, "A.save, D.del, C.cancel")?;
    d.present()
}

/// Full-screen confirmation (SAVED!, CANCELED!, Tare Done!).
pub fn banner<D: Display + ?Sized>(d: &mut D, text: &str) -> Result<(), DynError> {
    d.clear()?;
    d.draw_text(20, 25, 2, text)?;
    d.present()
}

/// Boot splash.
pub fn splash<D: Display + ?Sized>(d: &mut D) -> Result<(), DynError> {
    d.clear()?;
    d.draw_text(25, 20, 2, "scalewatch")?;
    d.draw_text(35, 45, 1, "starting...")?;
    d.present()
}
