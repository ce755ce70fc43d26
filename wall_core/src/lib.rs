#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core control logic for the wall rig (hardware-agnostic).
//!
//! All hardware interactions go through `wall_traits::MotorDriver` and
//! `wall_traits::AdcSource`. The engine is a single-threaded cooperative
//! polling loop; each [`ControlCore::step`] runs one cycle:
//!
//! 1. read raw torque (a failed read skips this cycle's torque decision),
//! 2. push the sample into the rolling average window,
//! 3. read the button ladder ADC and classify (a failed read means
//!    "unchanged", never "no press"),
//! 4. debounced edge detection — only `NoPress → button` transitions count
//!    as presses, so held buttons do not repeat,
//! 5. apply the pressed button's action (setpoint/incline/auto-mode),
//! 6. compare the rolling average against the configured torque trigger,
//! 7. issue a debounced speed command when desired and commanded state
//!    disagree.
//!
//! Transient I/O failures are logged and swallowed (degrade-to-noop, no
//! retry); only initialization failures are fatal, and those happen before
//! the loop is built.

// Module declarations
pub mod buttons;
pub mod conversions;
pub mod error;
pub mod events;
pub mod filter;
pub mod mocks;
pub mod runner;
pub mod state;
pub mod util;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;

use crate::error::{BuildError, Result, RigError};
use wall_traits::clock::{Clock, MonotonicClock};
use wall_traits::{AdcSource, MotorDriver};

pub use crate::buttons::{ButtonAction, ButtonId, ButtonMap, MatchMode};
pub use crate::events::UpdateEvent;
pub use crate::filter::RollingAverage;
pub use crate::state::{ControlState, MotorState, SharedSnapshot, StateSnapshot};

/// Direction of the torque comparison; depends on how the rig is cabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorqueTrigger {
    /// Average torque strictly above the threshold means excess resistance:
    /// disengage. At or below, run at the setpoint.
    StopAbove(i32),
    /// Average torque strictly below the threshold (typically 0 — removed
    /// cable slack pulls torque negative) engages the motor; at or above,
    /// disengage.
    RunBelow(i32),
}

impl TorqueTrigger {
    pub fn desired(self, avg_torque: f64) -> MotorState {
        match self {
            Self::StopAbove(t) => {
                if avg_torque > f64::from(t) {
                    MotorState::Idle
                } else {
                    MotorState::Running
                }
            }
            Self::RunBelow(t) => {
                if avg_torque < f64::from(t) {
                    MotorState::Running
                } else {
                    MotorState::Idle
                }
            }
        }
    }
}

/// Control configuration.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    pub trigger: TorqueTrigger,
    /// Initial speed setpoint (RPM).
    pub setpoint_rpm: i32,
    /// Setpoint change per qualifying press (RPM).
    pub increment_rpm: i32,
    /// Lower setpoint clamp (RPM).
    pub min_rpm: i32,
    /// Optional upper setpoint clamp; `None` leaves the setpoint unbounded.
    pub max_rpm: Option<i32>,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            trigger: TorqueTrigger::StopAbove(100),
            setpoint_rpm: 2000,
            increment_rpm: 200,
            min_rpm: 0,
            max_rpm: Some(3000),
        }
    }
}

/// Debounce and pacing configuration.
#[derive(Debug, Clone)]
pub struct TimingCfg {
    /// Poll cycle interval (ms).
    pub poll_ms: u64,
    /// Minimum elapsed time before a second button-state change is honored.
    pub button_debounce_ms: u64,
    /// Minimum elapsed time between issued speed commands.
    pub speed_debounce_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            poll_ms: 100,
            button_debounce_ms: 100,
            speed_debounce_ms: 200,
        }
    }
}

/// Incline display range; the angle is surfaced state, the incline drive
/// itself is not commanded from this loop.
#[derive(Debug, Clone)]
pub struct InclineCfg {
    pub step_deg: i32,
    pub min_deg: i32,
    pub max_deg: i32,
}

impl Default for InclineCfg {
    fn default() -> Self {
        Self {
            step_deg: 5,
            min_deg: -45,
            max_deg: 15,
        }
    }
}

/// Outcome of the speed command attempted this cycle, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Driver acknowledged the setpoint (RPM).
    Acked(i32),
    /// Driver reported a failure status; the command stays pending and is
    /// re-issued after the debounce window.
    Failed(i32),
}

/// What one poll cycle observed and did.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cycle {
    /// Raw torque, when the read succeeded.
    pub torque: Option<i32>,
    pub avg_torque: f64,
    /// Classified button, when the ADC read succeeded.
    pub button: Option<ButtonId>,
    /// Action applied by a qualifying press this cycle.
    pub pressed: Option<ButtonAction>,
    pub command: Option<CommandOutcome>,
    /// Slack interlock held the motor at zero this cycle.
    pub interlocked: bool,
}

/// The polling control loop over a motor driver and a button ADC.
pub struct ControlCore<D: MotorDriver, A: AdcSource> {
    driver: D,
    adc: A,
    map: ButtonMap,
    control: ControlCfg,
    timing: TimingCfg,
    incline: InclineCfg,
    window: RollingAverage,
    state: ControlState,
    // Unified clock for deterministic time in tests
    clock: Arc<dyn Clock + Send + Sync>,
    // Epoch Instant for computing monotonic milliseconds
    epoch: Instant,
    // Optional slack-sensor check; while debounced-active the motor is held
    // at zero. Non-latching.
    interlock_check: Option<Box<dyn Fn() -> bool>>,
    interlock_debounce_n: u8,
    interlock_count: u8,
    interlock_active: bool,
    // Display side: change events plus a per-cycle snapshot under one lock.
    events: Option<xch::Sender<UpdateEvent>>,
    shared: Option<SharedSnapshot>,
}

impl<D: MotorDriver, A: AdcSource> core::fmt::Debug for ControlCore<D, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlCore")
            .field("target_rpm", &self.state.target_rpm)
            .field("commanded_rpm", &self.state.commanded_rpm)
            .field("motor", &self.state.motor)
            .finish()
    }
}

impl<D: MotorDriver, A: AdcSource> ControlCore<D, A> {
    /// One poll cycle. Never fails: transient I/O errors are logged and the
    /// affected decision is skipped for this cycle.
    pub fn step(&mut self) -> Cycle {
        let now = self.clock.ms_since(self.epoch);
        let mut cycle = Cycle {
            interlocked: self.poll_interlock(),
            ..Cycle::default()
        };

        // 1-2) torque sample into the rolling window
        match self.driver.torque() {
            Ok(v) => {
                self.window.push(v);
                cycle.torque = Some(v);
            }
            Err(e) => {
                tracing::warn!(error = %e, "torque read failed; skipping torque decision");
            }
        }
        cycle.avg_torque = self.window.average();

        // 3-5) button sampling, edge detection, setpoint adjustment
        match self.adc.read() {
            Ok(sample) => {
                let button = self.map.classify(sample);
                cycle.button = Some(button);
                self.handle_button_edge(button, now, &mut cycle);
            }
            Err(e) => {
                // "unchanged", not "no press": a dropout must not fabricate
                // release/press edges
                tracing::warn!(error = %e, "button sample failed; state unchanged");
            }
        }

        // 6-7) torque trigger and debounced speed command. Decisions only run
        // on cycles with a fresh torque sample, except that an active
        // interlock always forces the motor down.
        if cycle.torque.is_some() || cycle.interlocked {
            let desired = if cycle.interlocked {
                MotorState::Idle
            } else {
                self.control.trigger.desired(cycle.avg_torque)
            };
            self.reconcile(desired, now, &mut cycle);
        }

        self.publish();
        tracing::trace!(
            torque = ?cycle.torque,
            avg = cycle.avg_torque,
            button = ?cycle.button,
            command = ?cycle.command,
            "cycle"
        );
        cycle
    }

    /// Final zero-speed command and handle release. Callers must invoke this
    /// exactly once, on every exit path.
    pub fn shutdown(&mut self) -> Result<()> {
        let mut first_err: Option<RigError> = None;
        match self.driver.set_speed(0) {
            Ok(()) => {
                self.state.commanded_rpm = 0;
                if self.state.motor == MotorState::Running {
                    self.state.motor = MotorState::Idle;
                    self.emit(UpdateEvent::Running(false));
                }
                tracing::info!("motor stopped for shutdown");
            }
            Err(e) => {
                tracing::warn!(error = %e, "final zero-speed command failed");
                first_err = Some(map_driver_error(&*e));
            }
        }
        if let Err(e) = self.driver.close() {
            tracing::warn!(error = %e, "driver close failed");
            first_err = first_err.or(Some(map_driver_error(&*e)));
        }
        self.publish();
        match first_err {
            None => Ok(()),
            Some(e) => Err(error::Report::new(e)),
        }
    }

    /// Read-only view of the loop state for the display side.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            target_rpm: self.state.target_rpm,
            commanded_rpm: self.state.commanded_rpm,
            running: self.state.motor == MotorState::Running,
            incline_deg: self.state.incline_deg,
            auto_mode: self.state.auto_mode,
            avg_torque: self.window.average(),
        }
    }

    pub fn timing(&self) -> &TimingCfg {
        &self.timing
    }

    /// Milliseconds since the loop epoch.
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn sleep(&self, d: Duration) {
        self.clock.sleep(d);
    }

    fn handle_button_edge(&mut self, button: ButtonId, now: u64, cycle: &mut Cycle) {
        if button == self.state.last_button {
            return;
        }
        let debounced = match self.state.last_button_change_ms {
            None => true,
            Some(t) => now.saturating_sub(t) > self.timing.button_debounce_ms,
        };
        if !debounced {
            return;
        }
        // Press = NoPress -> button. Button-to-button and release edges carry
        // no action; this is what suppresses repeats while held.
        if self.state.last_button == ButtonId::NoPress && button != ButtonId::NoPress {
            if let Some(action) = self.map.action(button) {
                self.apply_action(action);
                cycle.pressed = Some(action);
            }
        }
        self.state.last_button = button;
        self.state.last_button_change_ms = Some(now);
    }

    fn apply_action(&mut self, action: ButtonAction) {
        match action {
            ButtonAction::SpeedUp => {
                let next = util::clamp_rpm(
                    self.state.target_rpm.saturating_add(self.control.increment_rpm),
                    self.control.min_rpm,
                    self.control.max_rpm,
                );
                if next != self.state.target_rpm {
                    self.state.target_rpm = next;
                    tracing::info!(rpm = next, "setpoint increased");
                    self.emit(UpdateEvent::Speed(next));
                }
            }
            ButtonAction::SpeedDown => {
                let next = util::clamp_rpm(
                    self.state.target_rpm.saturating_sub(self.control.increment_rpm),
                    self.control.min_rpm,
                    self.control.max_rpm,
                );
                if next != self.state.target_rpm {
                    self.state.target_rpm = next;
                    tracing::info!(rpm = next, "setpoint decreased");
                    self.emit(UpdateEvent::Speed(next));
                }
            }
            ButtonAction::InclineUp => {
                let next = (self.state.incline_deg + self.incline.step_deg)
                    .min(self.incline.max_deg);
                if next != self.state.incline_deg {
                    self.state.incline_deg = next;
                    tracing::info!(deg = next, "incline increased");
                    self.emit(UpdateEvent::Incline(next));
                }
            }
            ButtonAction::InclineDown => {
                let next = (self.state.incline_deg - self.incline.step_deg)
                    .max(self.incline.min_deg);
                if next != self.state.incline_deg {
                    self.state.incline_deg = next;
                    tracing::info!(deg = next, "incline decreased");
                    self.emit(UpdateEvent::Incline(next));
                }
            }
            ButtonAction::ToggleAuto => {
                self.state.auto_mode = !self.state.auto_mode;
                tracing::info!(on = self.state.auto_mode, "auto mode toggled");
                self.emit(UpdateEvent::AutoMode(self.state.auto_mode));
            }
        }
    }

    fn reconcile(&mut self, desired: MotorState, now: u64, cycle: &mut Cycle) {
        let want_rpm = match desired {
            MotorState::Idle => 0,
            MotorState::Running => self.state.target_rpm,
        };
        if want_rpm == self.state.commanded_rpm {
            return;
        }
        let debounced = match self.state.last_speed_change_ms {
            None => true,
            Some(t) => now.saturating_sub(t) >= self.timing.speed_debounce_ms,
        };
        if !debounced {
            return;
        }
        match self.driver.set_speed(want_rpm) {
            Ok(()) => {
                let was_running = self.state.motor == MotorState::Running;
                self.state.commanded_rpm = want_rpm;
                self.state.motor = desired;
                self.state.last_speed_change_ms = Some(now);
                cycle.command = Some(CommandOutcome::Acked(want_rpm));
                tracing::info!(
                    rpm = want_rpm,
                    avg_torque = cycle.avg_torque,
                    "speed command"
                );
                let is_running = desired == MotorState::Running;
                if was_running != is_running {
                    self.emit(UpdateEvent::Running(is_running));
                }
            }
            Err(e) => {
                // Commanded state is deliberately NOT updated: the intent
                // (desired != commanded) persists and the command is
                // re-issued once the debounce window passes. Advancing the
                // timestamp rate-limits those retries.
                self.state.last_speed_change_ms = Some(now);
                cycle.command = Some(CommandOutcome::Failed(want_rpm));
                tracing::warn!(rpm = want_rpm, error = %e, "speed command failed; will retry");
            }
        }
    }

    fn poll_interlock(&mut self) -> bool {
        let Some(check) = &self.interlock_check else {
            return false;
        };
        if check() {
            self.interlock_count = self.interlock_count.saturating_add(1);
            if self.interlock_count >= self.interlock_debounce_n && !self.interlock_active {
                self.interlock_active = true;
                tracing::warn!("slack interlock engaged; holding motor at zero");
            }
        } else {
            if self.interlock_active {
                tracing::info!("slack interlock cleared");
            }
            self.interlock_count = 0;
            self.interlock_active = false;
        }
        self.interlock_active
    }

    fn emit(&self, ev: UpdateEvent) {
        if let Some(tx) = &self.events
            && tx.try_send(ev).is_err()
        {
            // Display is best-effort; a full or closed channel drops the update.
            tracing::debug!(kind = ev.kind(), "display channel unavailable; update dropped");
        }
    }

    fn publish(&self) {
        if let Some(shared) = &self.shared
            && let Ok(mut guard) = shared.lock()
        {
            *guard = self.snapshot();
        }
    }
}

// Map any boxed driver error to a typed RigError, with special handling for
// hardware errors when the hardware-errors feature is on.
fn map_driver_error(e: &(dyn std::error::Error + 'static)) -> RigError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<wall_hardware::HwError>() {
        return match hw {
            wall_hardware::HwError::Fault(_) => RigError::DriverFault(hw.to_string()),
            other => RigError::Driver(other.to_string()),
        };
    }
    RigError::Driver(e.to_string())
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

use std::marker::PhantomData;

/// Boxed, dynamically dispatched controller preserving a simple public API.
pub struct Controller {
    inner: ControlCore<Box<dyn MotorDriver>, Box<dyn AdcSource>>,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.inner.fmt(f)
    }
}

impl Controller {
    /// Start building a controller.
    pub fn builder() -> ControllerBuilder<Missing, Missing> {
        ControllerBuilder::default()
    }

    pub fn step(&mut self) -> Cycle {
        self.inner.step()
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.snapshot()
    }

    pub fn timing(&self) -> &TimingCfg {
        self.inner.timing()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.inner.elapsed_ms()
    }

    pub fn sleep(&self, d: Duration) {
        self.inner.sleep(d);
    }
}

/// Builder for [`Controller`]. Driver and ADC advance the type-state; all
/// other pieces default. Validation happens in `try_build`.
pub struct ControllerBuilder<D, A> {
    driver: Option<Box<dyn MotorDriver>>,
    adc: Option<Box<dyn AdcSource>>,
    map: Option<ButtonMap>,
    control: Option<ControlCfg>,
    timing: Option<TimingCfg>,
    incline: Option<InclineCfg>,
    window: Option<usize>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    interlock_check: Option<Box<dyn Fn() -> bool>>,
    interlock_debounce_n: Option<u8>,
    events: Option<xch::Sender<UpdateEvent>>,
    shared: Option<SharedSnapshot>,
    _d: PhantomData<D>,
    _a: PhantomData<A>,
}

impl Default for ControllerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            driver: None,
            adc: None,
            map: None,
            control: None,
            timing: None,
            incline: None,
            window: None,
            clock: None,
            interlock_check: None,
            interlock_debounce_n: None,
            events: None,
            shared: None,
            _d: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<D, A> ControllerBuilder<D, A> {
    fn transmute_state<D2, A2>(self) -> ControllerBuilder<D2, A2> {
        ControllerBuilder {
            driver: self.driver,
            adc: self.adc,
            map: self.map,
            control: self.control,
            timing: self.timing,
            incline: self.incline,
            window: self.window,
            clock: self.clock,
            interlock_check: self.interlock_check,
            interlock_debounce_n: self.interlock_debounce_n,
            events: self.events,
            shared: self.shared,
            _d: PhantomData,
            _a: PhantomData,
        }
    }

    pub fn with_buttons(mut self, map: ButtonMap) -> Self {
        self.map = Some(map);
        self
    }
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_incline(mut self, incline: InclineCfg) -> Self {
        self.incline = Some(incline);
        self
    }
    /// Rolling average window capacity (torque samples).
    pub fn with_window(mut self, capacity: usize) -> Self {
        self.window = Some(capacity);
        self
    }
    /// Provide a custom clock; defaults to MonotonicClock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_interlock<F>(mut self, check: F, debounce_n: u8) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.interlock_check = Some(Box::new(check));
        self.interlock_debounce_n = Some(debounce_n.max(1));
        self
    }
    pub fn with_events(mut self, tx: xch::Sender<UpdateEvent>) -> Self {
        self.events = Some(tx);
        self
    }
    pub fn with_shared(mut self, shared: SharedSnapshot) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<Controller> {
        let driver = self
            .driver
            .ok_or_else(|| error::Report::new(BuildError::MissingDriver))?;
        let adc = self
            .adc
            .ok_or_else(|| error::Report::new(BuildError::MissingAdc))?;
        let map = self.map.unwrap_or_else(default_button_map);
        let control = self.control.unwrap_or_default();
        let timing = self.timing.unwrap_or_default();
        let incline = self.incline.unwrap_or_default();
        let window = self.window.unwrap_or(5);
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        validate_cfg(&control, &timing, &incline, window)?;

        let epoch = clock.now();
        Ok(Controller {
            inner: ControlCore {
                driver,
                adc,
                map,
                state: ControlState::new(control.setpoint_rpm),
                window: RollingAverage::new(window),
                control,
                timing,
                incline,
                clock,
                epoch,
                interlock_check: self.interlock_check,
                interlock_debounce_n: self.interlock_debounce_n.unwrap_or(2),
                interlock_count: 0,
                interlock_active: false,
                events: self.events,
                shared: self.shared,
            },
        })
    }
}

// Setters that advance type-state when providing mandatory components
impl<A> ControllerBuilder<Missing, A> {
    pub fn with_driver(mut self, driver: impl MotorDriver + 'static) -> ControllerBuilder<Set, A> {
        self.driver = Some(Box::new(driver));
        self.transmute_state()
    }
}

impl<D> ControllerBuilder<D, Missing> {
    pub fn with_adc(mut self, adc: impl AdcSource + 'static) -> ControllerBuilder<D, Set> {
        self.adc = Some(Box::new(adc));
        self.transmute_state()
    }
}

impl ControllerBuilder<Set, Set> {
    /// Validate and build. Only available once driver and ADC are set.
    pub fn build(self) -> Result<Controller> {
        self.try_build()
    }
}

fn validate_cfg(
    control: &ControlCfg,
    timing: &TimingCfg,
    incline: &InclineCfg,
    window: usize,
) -> Result<()> {
    if control.increment_rpm <= 0 {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "increment_rpm must be > 0",
        )));
    }
    if control.min_rpm < 0 {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "min_rpm must be >= 0",
        )));
    }
    if let Some(max) = control.max_rpm {
        if max < control.min_rpm {
            return Err(error::Report::new(BuildError::InvalidConfig(
                "max_rpm must be >= min_rpm",
            )));
        }
        if control.setpoint_rpm > max {
            return Err(error::Report::new(BuildError::InvalidConfig(
                "setpoint_rpm must be <= max_rpm",
            )));
        }
    }
    if control.setpoint_rpm < control.min_rpm {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "setpoint_rpm must be >= min_rpm",
        )));
    }
    if timing.poll_ms == 0 {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "poll_ms must be >= 1",
        )));
    }
    if window == 0 {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "window must be >= 1",
        )));
    }
    if incline.step_deg <= 0 || incline.min_deg >= incline.max_deg {
        return Err(error::Report::new(BuildError::InvalidConfig(
            "incline range must be ordered with step > 0",
        )));
    }
    Ok(())
}

fn default_button_map() -> ButtonMap {
    ButtonMap::from(&wall_config::ButtonsCfg::default())
}

/// Build a generic, statically dispatched control core from concrete driver
/// and ADC implementations.
#[allow(clippy::too_many_arguments)]
pub fn build_core<D, A>(
    driver: D,
    adc: A,
    map: ButtonMap,
    control: ControlCfg,
    timing: TimingCfg,
    incline: InclineCfg,
    window: usize,
    interlock: Option<(Box<dyn Fn() -> bool>, u8)>,
    events: Option<xch::Sender<UpdateEvent>>,
    shared: Option<SharedSnapshot>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ControlCore<D, A>>
where
    D: MotorDriver + 'static,
    A: AdcSource + 'static,
{
    validate_cfg(&control, &timing, &incline, window)?;
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();
    let (interlock_check, interlock_debounce_n) = match interlock {
        Some((check, n)) => (Some(check), n.max(1)),
        None => (None, 2),
    };
    Ok(ControlCore {
        driver,
        adc,
        map,
        state: ControlState::new(control.setpoint_rpm),
        window: RollingAverage::new(window),
        control,
        timing,
        incline,
        clock,
        epoch,
        interlock_check,
        interlock_debounce_n,
        interlock_count: 0,
        interlock_active: false,
        events,
        shared,
    })
}
