//! Human-readable error descriptions and structured JSON error output.

use scalewatch_core::{ControlError, StoreError};

/// Map an eyre::Report to an explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Timeout => {
                "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DT/SCK pins and power, and consider increasing hardware.sensor_read_timeout_ms in the config.".to_string()
            }
            ControlError::SensorFault(n) => format!(
                "What happened: The scale failed {n} reads in a row and the controller shut down safe.\nLikely causes: Loose HX711 wiring, power brownout, or a dead load cell.\nHow to fix: Check wiring and power, then restart. Raise sampling.fault_limit only if transient dropouts are expected."
            ),
            ControlError::Display(msg) => format!(
                "What happened: The display stopped accepting frames ({msg}).\nLikely causes: Display disconnected or the I/O backend failed.\nHow to fix: Check the display connection and restart."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<StoreError>() {
        return match se {
            StoreError::BadMagic | StoreError::Corrupt => format!(
                "What happened: The saved configuration record is unreadable ({se}).\nLikely causes: First boot, interrupted save, or a damaged store file.\nHow to fix: Nothing required; defaults are in effect. Re-save limit/delay/calibration from the keypad to write a fresh record."
            ),
            StoreError::UnsupportedVersion(v) => format!(
                "What happened: The saved record has format version {v}, which this build does not read.\nLikely causes: Store file written by a newer build.\nHow to fix: Upgrade, or delete the store file to start from defaults."
            ),
            other => format!(
                "What happened: Store access failed ({other}).\nLikely causes: Bad path in [store], permissions, or a full disk.\nHow to fix: Check store.path in the config and file permissions."
            ),
        };
    }

    // String heuristics for init/config errors
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("gpio") {
        return "What happened: Failed to initialize GPIO.\nLikely causes: Incorrect pin numbers or insufficient permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process may access GPIO.".to_string();
    }

    if lower.contains("keypad matrix") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// One JSON line for scripted consumers, written to stderr on failure.
pub fn json_error_line(err: &eyre::Report) -> String {
    serde_json::json!({
        "event": "fatal",
        "error": err.to_string(),
        "detail": humanize(err),
    })
    .to_string()
}
