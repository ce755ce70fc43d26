//! Test and helper fakes for wall_core.
//!
//! Deterministic in-memory stand-ins for the driver facade and the ADC,
//! shared by unit and integration tests (and usable by downstream crates).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use wall_traits::{AdcSource, MotorDriver};

/// Everything a [`FakeDriver`] was asked to do, in order.
#[derive(Debug, Default, Clone)]
pub struct DriverCalls {
    /// Acknowledged speed commands.
    pub speeds: Vec<i32>,
    /// Speed commands that were rejected with an error status.
    pub failed_speeds: Vec<i32>,
    pub clear_fault_calls: u32,
    pub close_calls: u32,
}

/// Shared, cloneable view into a [`FakeDriver`]'s recorded calls. Survives
/// moving the driver into a control loop.
#[derive(Debug, Default, Clone)]
pub struct DriverLog(Arc<Mutex<DriverCalls>>);

impl DriverLog {
    pub fn calls(&self) -> DriverCalls {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

/// Scripted motor driver: plays back a torque sequence (repeating the last
/// good value once exhausted) and records every command it receives.
pub struct FakeDriver {
    torque: VecDeque<Result<i32, ()>>,
    last_torque: i32,
    fail_set_speed: Arc<AtomicBool>,
    log: DriverLog,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::with_torque([])
    }
}

impl FakeDriver {
    /// Driver whose torque reads return `seq` in order, then repeat the last
    /// value (0 if the script is empty).
    pub fn with_torque(seq: impl IntoIterator<Item = i32>) -> Self {
        Self::with_script(seq.into_iter().map(Ok))
    }

    /// Full script form: `Err(())` entries simulate failed torque reads.
    pub fn with_script(seq: impl IntoIterator<Item = Result<i32, ()>>) -> Self {
        Self {
            torque: seq.into_iter().collect(),
            last_torque: 0,
            fail_set_speed: Arc::new(AtomicBool::new(false)),
            log: DriverLog::default(),
        }
    }

    pub fn log(&self) -> DriverLog {
        self.log.clone()
    }

    /// Flag that makes every subsequent `set_speed` report a failed status.
    pub fn fail_flag(&self) -> Arc<AtomicBool> {
        self.fail_set_speed.clone()
    }
}

impl MotorDriver for FakeDriver {
    fn set_speed(
        &mut self,
        rpm: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_set_speed.load(Ordering::Relaxed) {
            if let Ok(mut g) = self.log.0.lock() {
                g.failed_speeds.push(rpm);
            }
            return Err(Box::new(std::io::Error::other("set_speed status -1")));
        }
        if let Ok(mut g) = self.log.0.lock() {
            g.speeds.push(rpm);
        }
        Ok(())
    }

    fn torque(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        match self.torque.pop_front() {
            Some(Ok(v)) => {
                self.last_torque = v;
                Ok(v)
            }
            Some(Err(())) => Err(Box::new(std::io::Error::other("torque status -1"))),
            None => Ok(self.last_torque),
        }
    }

    fn clear_faults(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.log.0.lock() {
            g.clear_fault_calls += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.log.0.lock() {
            g.close_calls += 1;
        }
        Ok(())
    }
}

/// Scripted ADC: plays back samples (`Err(())` = transient read failure),
/// repeating the last entry once exhausted.
pub struct ScriptedAdc {
    seq: VecDeque<Result<i32, ()>>,
    last: Result<i32, ()>,
}

impl ScriptedAdc {
    pub fn new(seq: impl IntoIterator<Item = Result<i32, ()>>) -> Self {
        Self {
            seq: seq.into_iter().collect(),
            last: Err(()),
        }
    }

    /// ADC pinned to a single level (e.g. the idle ladder voltage).
    pub fn constant(sample: i32) -> Self {
        Self::new([Ok(sample)])
    }
}

impl AdcSource for ScriptedAdc {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let next = self.seq.pop_front().unwrap_or(self.last);
        self.last = next;
        match next {
            Ok(v) => Ok(v),
            Err(()) => Err(Box::new(std::io::Error::other("adc read failed"))),
        }
    }
}

/// An ADC that always errors; for loops that run without a button panel.
pub struct NoopAdc;

impl AdcSource for NoopAdc {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("no adc attached")))
    }
}
