//! `scalewatch` binary: config loading, logging setup, signal
//! handling, and wiring the hardware backends into the runner.

mod cli;
mod error_fmt;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use scalewatch_config::Config;
use scalewatch_core::runner::RunnerParams;
use scalewatch_core::{PersistedConfig, SharedState, persist, runner};
use scalewatch_hardware::{ConsoleDisplay, FileStore};
use scalewatch_traits::Scale;
use scalewatch_traits::clock::{Clock, MonotonicClock};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("error reporter init failed: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::json_error_line(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (cfg, config_found) = load_config(&cli.config)?;
    init_logging(&cli, &cfg.logging)?;
    if !config_found {
        warn!(path = %cli.config.display(), "config file not found; using built-in defaults");
    }

    match cli.cmd {
        Commands::SelfCheck => self_check(&cfg),
        Commands::Run { sim_step, sim_max } => run_controller(&cfg, sim_step, sim_max),
    }
}

fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        let cfg = Config::default();
        cfg.validate()?;
        return Ok((cfg, false));
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = scalewatch_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok((cfg, true))
}

fn init_logging(cli: &Cli, logging: &scalewatch_config::Logging) -> Result<()> {
    let level = logging
        .level
        .clone()
        .unwrap_or_else(|| cli.log_level.clone());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(filter.boxed());
    layers.push(if cli.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    });

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let name = path
            .file_name()
            .map_or_else(|| "scalewatch.log".into(), |n| n.to_os_string());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("init logging")
}

/// Boot probe: store readable, scale sampling, display rendering.
fn self_check(cfg: &Config) -> Result<()> {
    let mut store = FileStore::open(&cfg.store.path)?;
    match persist::load(&mut store) {
        Ok(rec) => info!(
            calibration_factor = rec.calibration_factor,
            limit_g = rec.limit_g,
            delay_ms = rec.actuator_delay_ms,
            "persisted record ok"
        ),
        Err(e) => info!(reason = %e, "no valid persisted record; defaults would apply"),
    }

    let timeout = Duration::from_millis(cfg.hardware.sensor_read_timeout_ms);
    let mut scale = boot_scale(cfg, 100, 1_000)?;
    for _ in 0..3 {
        scale
            .read(timeout)
            .map_err(|e| eyre::eyre!("scale sample failed: {e}"))?;
    }

    let mut display = ConsoleDisplay::default();
    scalewatch_ui::splash(&mut display).map_err(|e| eyre::eyre!("display render failed: {e}"))?;

    println!("self-check ok");
    Ok(())
}

fn run_controller(cfg: &Config, sim_step: i32, sim_max: i32) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Release);
        })
        .wrap_err("install ctrl-c handler")?;
    }

    let mut store = FileStore::open(&cfg.store.path)?;
    let persisted = match persist::load(&mut store) {
        Ok(rec) => {
            info!(
                calibration_factor = rec.calibration_factor,
                limit_g = rec.limit_g,
                delay_ms = rec.actuator_delay_ms,
                "restored persisted configuration"
            );
            rec
        }
        Err(e) => {
            warn!(reason = %e, "no valid persisted record; using [defaults]");
            PersistedConfig {
                calibration_factor: cfg.defaults.calibration_factor,
                limit_g: cfg.defaults.limit_g,
                actuator_delay_ms: cfg.defaults.actuator_delay_ms,
            }
        }
    };

    let state = Arc::new(SharedState::new(
        persisted.calibration_factor,
        persisted.limit_g,
        persisted.actuator_delay_ms,
    ));
    let params = RunnerParams::from_config(cfg);
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock);

    let mut display = ConsoleDisplay::default();
    scalewatch_ui::splash(&mut display).map_err(|e| eyre::eyre!("display render failed: {e}"))?;

    let scale = boot_scale(cfg, sim_step, sim_max)?;
    let actuator = boot_actuator(cfg)?;
    let keypad = boot_keypad(cfg)?;

    info!("controller starting; Ctrl-C to stop");
    runner::run(
        scale, actuator, keypad, display, store, state, persisted, params, clock, shutdown,
    )
}

#[cfg(not(feature = "hardware"))]
fn boot_scale(_cfg: &Config, sim_step: i32, sim_max: i32) -> Result<impl Scale + Send + 'static> {
    Ok(scalewatch_hardware::SimulatedScale::new(sim_step, sim_max))
}

#[cfg(not(feature = "hardware"))]
fn boot_actuator(_cfg: &Config) -> Result<impl scalewatch_traits::Actuator + Send + 'static> {
    Ok(scalewatch_hardware::SimulatedActuator)
}

#[cfg(not(feature = "hardware"))]
fn boot_keypad(_cfg: &Config) -> Result<impl scalewatch_traits::Keypad> {
    Ok(scalewatch_hardware::SimulatedKeypad::from_stdin())
}

#[cfg(feature = "hardware")]
fn boot_scale(cfg: &Config, _sim_step: i32, _sim_max: i32) -> Result<impl Scale + Send + 'static> {
    Ok(scalewatch_hardware::gpio::HardwareScale::new(
        cfg.pins.hx711_dt,
        cfg.pins.hx711_sck,
    )?)
}

#[cfg(feature = "hardware")]
fn boot_actuator(cfg: &Config) -> Result<impl scalewatch_traits::Actuator + Send + 'static> {
    Ok(scalewatch_hardware::gpio::GpioActuator::new(
        cfg.pins.buzzer,
        cfg.pins.relay,
    )?)
}

#[cfg(feature = "hardware")]
fn boot_keypad(cfg: &Config) -> Result<impl scalewatch_traits::Keypad> {
    // Config validation already enforces 4x4; the conversion makes the
    // scanner's keymap bound part of the constructor signature.
    let rows: &[u8; 4] = cfg
        .pins
        .keypad_rows
        .as_slice()
        .try_into()
        .map_err(|_| eyre::eyre!("keypad matrix must be exactly 4 rows by 4 columns"))?;
    let cols: &[u8; 4] = cfg
        .pins
        .keypad_cols
        .as_slice()
        .try_into()
        .map_err(|_| eyre::eyre!("keypad matrix must be exactly 4 rows by 4 columns"))?;
    Ok(scalewatch_hardware::gpio::MatrixKeypad::new(rows, cols)?)
}
