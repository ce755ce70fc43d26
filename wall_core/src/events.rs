//! Update events published to the display updater.

/// `(kind, value)` state change notification. The control loop emits these on
/// change only; the consumer owns its own rendering cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateEvent {
    /// Speed setpoint changed (RPM).
    Speed(i32),
    /// Incline angle changed (degrees).
    Incline(i32),
    /// Auto mode toggled.
    AutoMode(bool),
    /// Motor engaged or disengaged.
    Running(bool),
}

impl UpdateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Speed(_) => "speed",
            Self::Incline(_) => "incline",
            Self::AutoMode(_) => "auto_mode",
            Self::Running(_) => "running",
        }
    }
}
