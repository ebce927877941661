use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("sensor faulted {0} consecutive times")]
    SensorFault(u32),
    #[error("actuator error: {0}")]
    Actuator(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid state: {0}")]
    State(String),
}

/// Failures of the non-volatile record layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store record has bad magic")]
    BadMagic,
    #[error("unsupported store record version {0}")]
    UnsupportedVersion(u8),
    #[error("store record failed checksum")]
    Corrupt,
    #[error("store access out of bounds")]
    OutOfBounds,
    #[error("store io: {0}")]
    Io(String),
}

/// Recoverable numeric-entry problems; the dialog re-prompts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("nothing entered")]
    EmptyBuffer,
    #[error("cannot parse entry: {0}")]
    Unparseable(String),
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
