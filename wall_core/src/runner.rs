//! Loop orchestration: poll, sleep, shut down cleanly.
//!
//! The scheduling model is deliberately a busy-poll with a fixed sleep — the
//! hardware sampling rate does not justify async machinery. The runner owns
//! the terminal sequence: whatever ends the loop (interrupt flag, deadline,
//! or caller-side error), the driver sees exactly one final zero-speed
//! command followed by exactly one close.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::Result;
use crate::{CommandOutcome, ControlCore};
use wall_traits::{AdcSource, MotorDriver};

/// Counters accumulated over one run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub cycles: u64,
    /// Cycles whose torque read failed and skipped the torque decision.
    pub skipped_reads: u64,
    /// Acknowledged speed commands.
    pub commands: u64,
    /// Speed commands the driver rejected.
    pub failed_commands: u64,
}

/// Run the control loop until the shutdown flag is raised or the optional
/// deadline (ms since loop epoch) passes. Returns the run counters; the
/// shutdown sequence runs on every exit path before this returns.
pub fn run<D, A>(
    mut core: ControlCore<D, A>,
    shutdown: Arc<AtomicBool>,
    deadline_ms: Option<u64>,
) -> Result<RunStats>
where
    D: MotorDriver,
    A: AdcSource,
{
    let mut stats = RunStats::default();
    let poll = Duration::from_millis(core.timing().poll_ms);
    tracing::info!(poll_ms = core.timing().poll_ms, "control loop start");

    while !shutdown.load(Ordering::Relaxed) {
        let cycle = core.step();
        stats.cycles += 1;
        if cycle.torque.is_none() {
            stats.skipped_reads += 1;
        }
        match cycle.command {
            Some(CommandOutcome::Acked(_)) => stats.commands += 1,
            Some(CommandOutcome::Failed(_)) => stats.failed_commands += 1,
            None => {}
        }
        if let Some(limit) = deadline_ms
            && core.elapsed_ms() >= limit
        {
            tracing::info!(limit_ms = limit, "run deadline reached");
            break;
        }
        core.sleep(poll);
    }

    let shutdown_result = core.shutdown();
    tracing::info!(
        cycles = stats.cycles,
        commands = stats.commands,
        skipped = stats.skipped_reads,
        "control loop stopped"
    );
    shutdown_result.map(|()| stats)
}
