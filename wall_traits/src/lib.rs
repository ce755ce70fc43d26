pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Facade over the motor controller device. Implementations own the device
/// handle for their lifetime; `close` releases it and must be called exactly
/// once. Every operation returns a checked status — there are no fire-and-
/// forget commands on this bus.
pub trait MotorDriver {
    /// Command an absolute speed setpoint in RPM (0 stops the motor).
    fn set_speed(
        &mut self,
        rpm: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Read the current raw torque value (signed, sensor units).
    fn torque(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;

    /// Clear any latched faults and enable the drive.
    fn clear_faults(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Release the device handle. Idempotence is not required of
    /// implementations; callers must invoke this exactly once.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Source of raw analog-to-digital conversion results (the button ladder).
/// A read returns the latest conversion; transient failures are expected and
/// must be surfaced as errors, never panics.
pub trait AdcSource {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn set_speed(
        &mut self,
        rpm: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_speed(rpm)
    }
    fn torque(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).torque()
    }
    fn clear_faults(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).clear_faults()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}

impl<T: AdcSource + ?Sized> AdcSource for Box<T> {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}
