use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RigError {
    #[error("driver error: {0}")]
    Driver(String),
    #[error("driver fault: {0}")]
    DriverFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motor driver")]
    MissingDriver,
    #[error("missing ADC source")]
    MissingAdc,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
