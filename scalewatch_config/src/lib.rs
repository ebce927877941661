#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the weight-limit controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! Everything here is boot-time wiring; operator-set values (limit,
//! relay delay, calibration factor) live in the persisted store record
//! and only fall back to `[defaults]` when no valid record exists.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    pub buzzer: u8,
    pub relay: u8,
    /// Matrix keypad row GPIOs (4 rows expected).
    pub keypad_rows: Vec<u8>,
    /// Matrix keypad column GPIOs (4 columns expected).
    pub keypad_cols: Vec<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dt: 5,
            hx711_sck: 6,
            buzzer: 17,
            relay: 27,
            keypad_rows: vec![16, 20, 21, 26],
            keypad_cols: vec![13, 19, 12, 11],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Timing {
    /// Control loop period in milliseconds.
    pub control_period_ms: u64,
    /// UI refresh / keypad poll period in milliseconds.
    pub ui_period_ms: u64,
    /// Relay pulse width once triggered, in milliseconds.
    pub pulse_ms: u64,
    /// How long confirmation banners (SAVED!, CANCELED!, Tare Done!) stay up.
    pub banner_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            control_period_ms: 70,
            ui_period_ms: 300,
            pulse_ms: 350,
            banner_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sampling {
    /// Averaging window for each control-loop weight sample.
    pub sample_window: u32,
    /// Averaging window for the tare raw baseline.
    pub tare_window: u32,
    /// Abort the control loop after this many consecutive sensor failures.
    pub fault_limit: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            sample_window: 4,
            tare_window: 15,
            fault_limit: 10,
        }
    }
}

/// Boot fallbacks used when the store holds no valid record.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Defaults {
    pub calibration_factor: f32,
    pub limit_g: f32,
    pub actuator_delay_ms: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            calibration_factor: 5005.0,
            limit_g: 0.0,
            actuator_delay_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for HX711 data-ready (DT low) before failing
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
    /// Path to the non-volatile store image (EEPROM-style byte file).
    pub path: String,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            path: "scalewatch.eeprom".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub store: Store,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Timing
        if self.timing.control_period_ms == 0 {
            eyre::bail!("timing.control_period_ms must be >= 1");
        }
        if self.timing.ui_period_ms == 0 {
            eyre::bail!("timing.ui_period_ms must be >= 1");
        }
        if self.timing.pulse_ms == 0 {
            eyre::bail!("timing.pulse_ms must be >= 1");
        }
        if self.timing.control_period_ms > 10_000 {
            eyre::bail!("timing.control_period_ms is unreasonably large (>10s)");
        }
        if self.timing.banner_ms > 60_000 {
            eyre::bail!("timing.banner_ms is unreasonably large (>60s)");
        }

        // Sampling
        if self.sampling.sample_window == 0 {
            eyre::bail!("sampling.sample_window must be >= 1");
        }
        if self.sampling.tare_window == 0 {
            eyre::bail!("sampling.tare_window must be >= 1");
        }
        if self.sampling.fault_limit == 0 {
            eyre::bail!("sampling.fault_limit must be >= 1");
        }

        // Defaults
        if !self.defaults.calibration_factor.is_finite() || self.defaults.calibration_factor == 0.0
        {
            eyre::bail!("defaults.calibration_factor must be finite and non-zero");
        }
        if self.defaults.limit_g.is_sign_negative() {
            eyre::bail!("defaults.limit_g must be >= 0");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Pins
        if self.pins.keypad_rows.is_empty() || self.pins.keypad_cols.is_empty() {
            eyre::bail!("pins.keypad_rows and pins.keypad_cols must not be empty");
        }
        if self.pins.keypad_rows.len() != 4 || self.pins.keypad_cols.len() != 4 {
            eyre::bail!("keypad matrix must be 4x4");
        }

        // Store
        if self.store.path.is_empty() {
            eyre::bail!("store.path must not be empty");
        }

        Ok(())
    }
}
