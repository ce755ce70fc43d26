//! Hardware implementations of the wall rig trait seams.
//!
//! With the `hardware` feature on, the production pieces are available: the
//! vendor motor-control library binding, the sysfs ADC and the GPIO slack
//! sensor. Without it, only the simulated implementations build, which is
//! what CI and bench-top development use.

pub mod adc;
pub mod error;
#[cfg(feature = "hardware")]
pub mod simucube;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod slack;

pub use adc::SysfsAdc;
pub use error::HwError;
#[cfg(feature = "hardware")]
pub use simucube::{DEFAULT_DRIVER_LIB, SimucubeDriver};
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use slack::make_slack_checker;

use wall_traits::{AdcSource, MotorDriver};

/// Simulated motor driver: speed commands are accepted and logged, torque
/// follows a deterministic sawtooth from -200 to 200 so both trigger
/// directions get exercised during bench runs.
pub struct SimulatedDriver {
    torque: i32,
    commanded: i32,
    closed: bool,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self {
            torque: -200,
            commanded: 0,
            closed: false,
        }
    }

    pub fn commanded(&self) -> i32 {
        self.commanded
    }
}

impl MotorDriver for SimulatedDriver {
    fn set_speed(
        &mut self,
        rpm: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.commanded = rpm;
        tracing::debug!(rpm, "speed set (simulated)");
        Ok(())
    }

    fn torque(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        self.torque += 5;
        if self.torque > 200 {
            self.torque = -200;
        }
        Ok(self.torque)
    }

    fn clear_faults(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("faults cleared (simulated)");
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.closed = true;
        tracing::debug!("driver closed (simulated)");
        Ok(())
    }
}

/// Simulated button ladder pinned at the idle level.
pub struct SimulatedAdc {
    level: i32,
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAdc {
    pub fn new() -> Self {
        // idle ladder voltage of the factory panel
        Self { level: 3507 }
    }

    pub fn pinned(level: i32) -> Self {
        Self { level }
    }
}

impl AdcSource for SimulatedAdc {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.level)
    }
}
