//! Control-loop state, exclusively owned by the loop.

use std::sync::{Arc, Mutex};

use crate::buttons::ButtonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    /// Motor commanded to zero.
    Idle,
    /// Motor commanded to the target setpoint.
    Running,
}

/// Mutable record behind every cycle decision. Only the control loop writes
/// it; everyone else sees read-only [`StateSnapshot`] clones.
#[derive(Debug, Clone)]
pub struct ControlState {
    /// User-adjustable speed setpoint (RPM).
    pub target_rpm: i32,
    /// Last speed the driver acknowledged (RPM).
    pub commanded_rpm: i32,
    pub motor: MotorState,
    pub last_button: ButtonId,
    /// ms since loop epoch of the last honored button-state change;
    /// `None` until the first change (the first edge is never debounced away).
    pub last_button_change_ms: Option<u64>,
    /// ms since loop epoch of the last issued speed command.
    pub last_speed_change_ms: Option<u64>,
    /// Displayed incline angle (degrees).
    pub incline_deg: i32,
    pub auto_mode: bool,
}

impl ControlState {
    pub fn new(setpoint_rpm: i32) -> Self {
        Self {
            target_rpm: setpoint_rpm,
            commanded_rpm: 0,
            motor: MotorState::Idle,
            last_button: ButtonId::NoPress,
            last_button_change_ms: None,
            last_speed_change_ms: None,
            incline_deg: 0,
            auto_mode: false,
        }
    }
}

/// Read-only view published once per cycle for the display side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateSnapshot {
    pub target_rpm: i32,
    pub commanded_rpm: i32,
    pub running: bool,
    pub incline_deg: i32,
    pub auto_mode: bool,
    pub avg_torque: f64,
}

/// The single coarse lock shared between the polling and reporting sides.
/// Critical sections are a struct copy; contention is negligible at the
/// rig's poll rates.
pub type SharedSnapshot = Arc<Mutex<StateSnapshot>>;

pub fn shared_snapshot() -> SharedSnapshot {
    Arc::new(Mutex::new(StateSnapshot::default()))
}
