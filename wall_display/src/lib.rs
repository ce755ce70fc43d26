#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Display updater for the rig's two-line character display.
//!
//! A background thread consumes `(kind, value)` update events from the
//! control loop over a bounded channel and renders two 16-column lines
//! through [`DisplaySink`]. The sink behind the trait is the seam to the
//! actual panel hardware; the I2C byte-level driver lives outside this
//! workspace. Rendering cadence belongs to this side, not the control loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use wall_core::UpdateEvent;
use wall_core::util::rpm_to_m_per_min;

/// Character columns on the panel.
pub const LCD_WIDTH: usize = 16;

/// Where rendered lines go. Row is 1 or 2, text is exactly [`LCD_WIDTH`]
/// columns.
pub trait DisplaySink {
    fn write_line(
        &mut self,
        row: u8,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink that prints to stdout; bring-up and simulated runs.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn write_line(
        &mut self,
        row: u8,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("|{row}| {text}");
        Ok(())
    }
}

/// Current display model, folded from update events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub speed_rpm: i32,
    pub incline_deg: i32,
    pub auto_mode: bool,
    pub running: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            speed_rpm: 0,
            incline_deg: 0,
            auto_mode: false,
            running: false,
        }
    }
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= LCD_WIDTH {
        return text.chars().take(LCD_WIDTH).collect();
    }
    let pad = LCD_WIDTH - len;
    let left = pad / 2;
    format!(
        "{}{}{}",
        " ".repeat(left),
        text,
        " ".repeat(pad - left)
    )
}

impl Frame {
    pub fn apply(&mut self, ev: UpdateEvent) {
        match ev {
            UpdateEvent::Speed(rpm) => self.speed_rpm = rpm,
            UpdateEvent::Incline(deg) => self.incline_deg = deg,
            UpdateEvent::AutoMode(on) => self.auto_mode = on,
            UpdateEvent::Running(on) => self.running = on,
        }
    }

    /// `Speed: NN m/min`, with a trailing `*` while the motor runs.
    pub fn line1(&self) -> String {
        let mark = if self.running { "*" } else { "" };
        center(&format!(
            "Speed: {:02} m/min{}",
            rpm_to_m_per_min(self.speed_rpm),
            mark
        ))
    }

    /// `Tilt:  +DD deg`, with a trailing `A` in auto mode.
    pub fn line2(&self) -> String {
        let mark = if self.auto_mode { " A" } else { "" };
        center(&format!("Tilt: {:+03} deg{}", self.incline_deg, mark))
    }
}

/// Background display thread. Joined on drop; exits when the event channel
/// disconnects or the owner drops it.
pub struct Updater {
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl Updater {
    /// Spawn the updater with an initial full render. `refresh_ms` bounds
    /// how long the thread sleeps between wakeups, and so how fast it
    /// notices shutdown.
    pub fn spawn<S>(rx: Receiver<UpdateEvent>, mut sink: S, refresh_ms: u64) -> Self
    where
        S: DisplaySink + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = shutdown.clone();
        let wait = Duration::from_millis(refresh_ms.max(1));

        let join = std::thread::spawn(move || {
            let mut frame = Frame::default();
            render(&mut sink, &frame);

            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let mut dirty = false;
                match rx.recv_timeout(wait) {
                    Ok(ev) => {
                        frame.apply(ev);
                        dirty = true;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("event channel closed; display thread exiting");
                        break;
                    }
                }
                // Fold any burst of queued updates into one redraw.
                while let Ok(ev) = rx.try_recv() {
                    frame.apply(ev);
                    dirty = true;
                }
                if dirty {
                    render(&mut sink, &frame);
                }
            }
            tracing::trace!("display thread exiting cleanly");
        });

        Self {
            shutdown,
            join: Some(join),
        }
    }
}

fn render<S: DisplaySink>(sink: &mut S, frame: &Frame) {
    // Display is best-effort: a write failure costs one redraw, nothing else.
    if let Err(e) = sink.write_line(1, &frame.line1()) {
        tracing::warn!(error = %e, "display line 1 write failed");
    }
    if let Err(e) = sink.write_line(2, &frame.line2()) {
        tracing::warn!(error = %e, "display line 2 write failed");
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join.take()
            && handle.join().is_err()
        {
            tracing::warn!("display thread panicked during shutdown");
        }
    }
}
