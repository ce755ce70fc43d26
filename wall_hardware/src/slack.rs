//! Normally-closed slack sensor on a GPIO line.
//!
//! The sensor holds the line high while the cable is slack-free; an open
//! circuit (line low) means the climber unloaded the cable. A background
//! thread polls the line and the returned closure reads the latest state,
//! so the control loop never blocks on GPIO I/O.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::HwError;

/// Spawn the GPIO poller and return a checker closure: `true` means the
/// sensor circuit is open (slack detected). The poller thread runs for the
/// life of the process, like the sensor it watches.
pub fn make_slack_checker(
    chip: &str,
    line: u32,
    poll_ms: u64,
) -> Result<Box<dyn Fn() -> bool + Send + Sync>, HwError> {
    let chip = gpiod::Chip::new(chip).map_err(|e| HwError::Gpio(e.to_string()))?;
    let opts = gpiod::Options::input([line]).consumer("slack-sensor");
    let lines = chip
        .request_lines(opts)
        .map_err(|e| HwError::Gpio(e.to_string()))?;

    let triggered = Arc::new(AtomicBool::new(false));
    let flag = triggered.clone();
    let period = Duration::from_millis(poll_ms.max(1));

    thread::spawn(move || {
        loop {
            match lines.get_values([false; 1]) {
                Ok([level]) => {
                    // NC sensor: low level = open circuit = slack
                    flag.store(!level, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "slack sensor read failed");
                }
            }
            thread::sleep(period);
        }
    });

    Ok(Box::new(move || triggered.load(Ordering::Relaxed)))
}
