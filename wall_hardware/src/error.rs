use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("driver library: {0}")]
    Library(String),
    #[error("failed to open motor controller (status {0})")]
    Open(i32),
    #[error("speed command rejected (status {0})")]
    Command(i32),
    #[error("torque read failed (status {0})")]
    TorqueRead(i32),
    #[error("fault clear/enable failed (status {0})")]
    Fault(i32),
    #[error("adc parse: {0}")]
    Parse(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
