use std::time::Duration;

use wall_core::mocks::{FakeDriver, ScriptedAdc};
use wall_core::{
    ButtonMap, CommandOutcome, ControlCfg, ControlCore, InclineCfg, TimingCfg, TorqueTrigger,
    UpdateEvent, build_core,
};
use wall_traits::ManualClock;

const IDLE: i32 = 3507;
const BTN2: i32 = 540;
const BTN4: i32 = 1196;

fn factory_map() -> ButtonMap {
    ButtonMap::from(&wall_config::ButtonsCfg::default())
}

#[allow(clippy::too_many_arguments)]
fn build(
    driver: FakeDriver,
    adc: ScriptedAdc,
    control: ControlCfg,
    timing: TimingCfg,
    window: usize,
    clock: &ManualClock,
    events: Option<crossbeam_channel::Sender<UpdateEvent>>,
) -> ControlCore<FakeDriver, ScriptedAdc> {
    build_core(
        driver,
        adc,
        factory_map(),
        control,
        timing,
        InclineCfg::default(),
        window,
        None,
        events,
        None,
        Some(Box::new(clock.clone())),
    )
    .expect("build core")
}

fn no_speed_debounce() -> TimingCfg {
    TimingCfg {
        poll_ms: 100,
        button_debounce_ms: 100,
        speed_debounce_ms: 0,
    }
}

#[test]
fn high_average_torque_idles_a_running_motor_once() {
    // Window 5 fills with 150s; threshold 100. The motor engages on the
    // early low reading and must receive exactly one zero command when the
    // average crosses the threshold.
    let driver = FakeDriver::with_torque([-50, 150, 150, 150, 150, 150, 150]);
    let log = driver.log();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg {
            trigger: TorqueTrigger::StopAbove(100),
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        None,
    );

    for _ in 0..7 {
        core.step();
        clock.advance_ms(100);
    }

    let calls = log.calls();
    assert_eq!(calls.speeds, vec![2000, 0]);
    assert_eq!(calls.speeds.iter().filter(|&&s| s == 0).count(), 1);
    assert!(!core.snapshot().running);
}

#[test]
fn run_below_zero_engages_on_slack_and_releases() {
    // Wiring variant: negative average torque (slack removed) engages the
    // motor; at or above zero it disengages.
    let driver = FakeDriver::with_torque([-30, -30, 40, 40, 40]);
    let log = driver.log();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg {
            trigger: TorqueTrigger::RunBelow(0),
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        2,
        &clock,
        None,
    );

    for _ in 0..5 {
        core.step();
        clock.advance_ms(100);
    }

    let calls = log.calls();
    // engage at avg -30, release once avg reaches (40+40)/2
    assert_eq!(calls.speeds, vec![2000, 0]);
}

#[test]
fn torque_read_failures_skip_the_decision_entirely() {
    // Every read fails: the empty-window average of 0 must never drive a
    // command, even though 0 <= threshold would mean Running.
    let driver = FakeDriver::with_script([Err(()), Err(()), Err(())]);
    let log = driver.log();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg::default(),
        no_speed_debounce(),
        5,
        &clock,
        None,
    );

    for _ in 0..3 {
        let cycle = core.step();
        assert!(cycle.torque.is_none());
        assert!(cycle.command.is_none());
        clock.advance_ms(100);
    }
    assert!(log.calls().speeds.is_empty());
}

#[test]
fn press_sequence_registers_exactly_two_events() {
    // NoPress -> B2 -> B2 -> NoPress -> B2: one press for the first B2, one
    // for the re-press after the interstitial release, none for the repeat.
    let driver = FakeDriver::with_torque([150]); // avg > 100 keeps motor idle
    let clock = ManualClock::new();
    let (tx, rx) = crossbeam_channel::bounded(16);
    let mut core = build(
        driver,
        ScriptedAdc::new([Ok(IDLE), Ok(BTN2), Ok(BTN2), Ok(IDLE), Ok(BTN2)]),
        ControlCfg {
            max_rpm: None,
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        Some(tx),
    );

    for _ in 0..5 {
        core.step();
        clock.advance_ms(150); // beyond the 100ms button debounce
    }

    assert_eq!(core.snapshot().target_rpm, 2400);
    let speed_events: Vec<_> = rx
        .try_iter()
        .filter(|ev| matches!(ev, UpdateEvent::Speed(_)))
        .collect();
    assert_eq!(
        speed_events,
        vec![UpdateEvent::Speed(2200), UpdateEvent::Speed(2400)]
    );
}

#[test]
fn one_press_raises_the_setpoint_by_the_increment() {
    // Target 2000, increment 200, no upper clamp configured.
    let driver = FakeDriver::with_torque([150]);
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::new([Ok(IDLE), Ok(BTN2)]),
        ControlCfg {
            max_rpm: None,
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        None,
    );

    core.step();
    clock.advance_ms(150);
    let cycle = core.step();

    assert!(cycle.pressed.is_some());
    assert_eq!(core.snapshot().target_rpm, 2200);
}

#[test]
fn setpoint_clamps_at_both_limits() {
    let driver = FakeDriver::with_torque([150]);
    let clock = ManualClock::new();
    // alternate presses with releases so each press qualifies
    let script: Vec<Result<i32, ()>> = (0..20)
        .map(|i| if i % 2 == 0 { Ok(BTN2) } else { Ok(IDLE) })
        .collect();
    let mut core = build(
        driver,
        ScriptedAdc::new(script),
        ControlCfg {
            setpoint_rpm: 2800,
            min_rpm: 1000,
            max_rpm: Some(3000),
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        None,
    );
    for _ in 0..20 {
        core.step();
        clock.advance_ms(150);
    }
    assert_eq!(core.snapshot().target_rpm, 3000);

    // and the floor, with the decrement button
    let driver = FakeDriver::with_torque([150]);
    let script: Vec<Result<i32, ()>> = (0..20)
        .map(|i| if i % 2 == 0 { Ok(BTN4) } else { Ok(IDLE) })
        .collect();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::new(script),
        ControlCfg {
            setpoint_rpm: 1200,
            min_rpm: 1000,
            max_rpm: Some(3000),
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        None,
    );
    for _ in 0..20 {
        core.step();
        clock.advance_ms(150);
    }
    assert_eq!(core.snapshot().target_rpm, 1000);
}

#[test]
fn adc_dropout_reads_as_unchanged_not_release() {
    // B2 is held; a read failure in the middle must not fabricate a release
    // edge, so no second press fires when B2 reappears.
    let driver = FakeDriver::with_torque([150]);
    let clock = ManualClock::new();
    let (tx, rx) = crossbeam_channel::bounded(16);
    let mut core = build(
        driver,
        ScriptedAdc::new([Ok(IDLE), Ok(BTN2), Err(()), Ok(BTN2)]),
        ControlCfg {
            max_rpm: None,
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        Some(tx),
    );

    for _ in 0..4 {
        core.step();
        clock.advance_ms(150);
    }

    // exactly one setpoint change
    assert_eq!(core.snapshot().target_rpm, 2200);
    let speed_events: Vec<_> = rx
        .try_iter()
        .filter(|ev| matches!(ev, UpdateEvent::Speed(_)))
        .collect();
    assert_eq!(speed_events, vec![UpdateEvent::Speed(2200)]);
}

#[test]
fn rapid_button_bounce_inside_debounce_is_ignored() {
    let driver = FakeDriver::with_torque([150]);
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::new([Ok(IDLE), Ok(BTN2), Ok(IDLE), Ok(BTN2), Ok(IDLE)]),
        ControlCfg {
            max_rpm: None,
            ..ControlCfg::default()
        },
        TimingCfg {
            poll_ms: 10,
            button_debounce_ms: 100,
            speed_debounce_ms: 0,
        },
        5,
        &clock,
        None,
    );

    // First two polls 150ms apart: the press at B2 qualifies.
    core.step();
    clock.advance_ms(150);
    core.step();
    // Now bounce quickly: 10ms between polls, inside the 100ms debounce.
    for _ in 0..3 {
        clock.advance_ms(10);
        core.step();
    }
    // only the initial press counted
    assert_eq!(core.snapshot().target_rpm, 2200);
}

#[test]
fn two_crossings_inside_speed_debounce_yield_one_command() {
    // Torque flips across the threshold twice within the 200ms debounce;
    // only one speed command may result.
    let driver = FakeDriver::with_torque([0, 150, 0, 150, 150]);
    let log = driver.log();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg {
            trigger: TorqueTrigger::StopAbove(100),
            ..ControlCfg::default()
        },
        TimingCfg {
            poll_ms: 50,
            button_debounce_ms: 100,
            speed_debounce_ms: 200,
        },
        1, // window of 1 makes each sample the average
        &clock,
        None,
    );

    // t=0: engage at 2000 (first command is never debounced away)
    core.step();
    for _ in 0..3 {
        clock.advance_ms(50);
        core.step(); // crossings at t=50,100,150 all inside the window
    }
    assert_eq!(log.calls().speeds, vec![2000]);

    // t=200: debounce expired, the pending disengage goes out
    clock.advance_ms(50);
    core.step();
    assert_eq!(log.calls().speeds, vec![2000, 0]);
}

#[test]
fn failed_command_keeps_intent_and_retries_after_debounce() {
    let driver = FakeDriver::with_torque([0]);
    let log = driver.log();
    let fail = driver.fail_flag();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg {
            trigger: TorqueTrigger::StopAbove(100),
            ..ControlCfg::default()
        },
        TimingCfg {
            poll_ms: 50,
            button_debounce_ms: 100,
            speed_debounce_ms: 200,
        },
        5,
        &clock,
        None,
    );

    fail.store(true, std::sync::atomic::Ordering::Relaxed);
    let cycle = core.step();
    assert_eq!(cycle.command, Some(CommandOutcome::Failed(2000)));
    assert!(!core.snapshot().running, "failed command must not flip state");

    // Inside the debounce window: no retry yet.
    fail.store(false, std::sync::atomic::Ordering::Relaxed);
    clock.advance_ms(100);
    assert_eq!(core.step().command, None);

    // Past the debounce window: the pending command is re-issued.
    clock.advance_ms(100);
    let cycle = core.step();
    assert_eq!(cycle.command, Some(CommandOutcome::Acked(2000)));

    let calls = log.calls();
    assert_eq!(calls.failed_speeds, vec![2000]);
    assert_eq!(calls.speeds, vec![2000]);
    assert!(core.snapshot().running);
}

#[test]
fn setpoint_change_while_running_reissues_the_command() {
    let driver = FakeDriver::with_torque([0]);
    let log = driver.log();
    let clock = ManualClock::new();
    let mut core = build(
        driver,
        ScriptedAdc::new([Ok(IDLE), Ok(BTN2)]),
        ControlCfg {
            trigger: TorqueTrigger::StopAbove(100),
            max_rpm: None,
            ..ControlCfg::default()
        },
        no_speed_debounce(),
        5,
        &clock,
        None,
    );

    core.step(); // engages at 2000
    clock.advance_ms(150);
    core.step(); // press raises target to 2200; commanded 2000 != 2200
    clock.advance_ms(150);
    core.step();

    let calls = log.calls();
    assert_eq!(calls.speeds, vec![2000, 2200]);
    assert_eq!(core.snapshot().commanded_rpm, 2200);
}

#[test]
fn incline_and_auto_presses_update_display_state_only() {
    const BTN1: i32 = 5;
    const BTN3: i32 = 1807;
    const BTN5: i32 = 2615;
    let driver = FakeDriver::with_torque([150]);
    let log = driver.log();
    let clock = ManualClock::new();
    let (tx, rx) = crossbeam_channel::bounded(16);
    let mut core = build(
        driver,
        ScriptedAdc::new([
            Ok(IDLE),
            Ok(BTN3),
            Ok(IDLE),
            Ok(BTN1),
            Ok(IDLE),
            Ok(BTN5),
        ]),
        ControlCfg::default(),
        no_speed_debounce(),
        5,
        &clock,
        Some(tx),
    );

    for _ in 0..6 {
        core.step();
        clock.advance_ms(150);
    }

    let snap = core.snapshot();
    assert_eq!(snap.incline_deg, 0); // +5 then -5
    assert!(snap.auto_mode);
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            UpdateEvent::Incline(5),
            UpdateEvent::Incline(0),
            UpdateEvent::AutoMode(true),
        ]
    );
    // incline/auto never touch the motor
    assert!(log.calls().speeds.is_empty());
}

#[test]
fn incline_clamps_to_configured_range() {
    const BTN3: i32 = 1807;
    let driver = FakeDriver::with_torque([150]);
    let clock = ManualClock::new();
    let script: Vec<Result<i32, ()>> = (0..12)
        .map(|i| if i % 2 == 0 { Ok(BTN3) } else { Ok(IDLE) })
        .collect();
    let mut core = build(
        driver,
        ScriptedAdc::new(script),
        ControlCfg::default(),
        no_speed_debounce(),
        5,
        &clock,
        None,
    );
    for _ in 0..12 {
        core.step();
        clock.advance_ms(150);
    }
    // 6 presses at +5 deg, ceiling at +15
    assert_eq!(core.snapshot().incline_deg, 15);
}

#[test]
fn poll_cadence_sleep_is_interruptible_math_only() {
    // The runner sleeps via the core's clock; a manual clock turns that into
    // pure time arithmetic.
    let driver = FakeDriver::with_torque([0]);
    let clock = ManualClock::new();
    let core = build(
        driver,
        ScriptedAdc::constant(IDLE),
        ControlCfg::default(),
        no_speed_debounce(),
        5,
        &clock,
        None,
    );
    let before = core.elapsed_ms();
    core.sleep(Duration::from_millis(70));
    assert_eq!(core.elapsed_ms() - before, 70);
}
