use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use wall_core::mocks::{FakeDriver, ScriptedAdc};
use wall_core::runner::run;
use wall_core::{
    ButtonMap, ControlCfg, Controller, InclineCfg, TimingCfg, TorqueTrigger, build_core,
};
use wall_traits::ManualClock;

fn factory_map() -> ButtonMap {
    ButtonMap::from(&wall_config::ButtonsCfg::default())
}

#[test]
fn interrupt_while_running_stops_then_closes_exactly_once() {
    // Torque stays low, so the loop engages and keeps the motor running
    // until the interrupt arrives.
    let driver = FakeDriver::with_torque([0]);
    let log = driver.log();
    let core = build_core(
        driver,
        ScriptedAdc::constant(3507),
        factory_map(),
        ControlCfg {
            trigger: TorqueTrigger::StopAbove(100),
            ..ControlCfg::default()
        },
        TimingCfg {
            poll_ms: 5,
            button_debounce_ms: 100,
            speed_debounce_ms: 0,
        },
        InclineCfg::default(),
        5,
        None,
        None,
        None,
        None, // real clock: the interrupt arrives from another thread
    )
    .expect("build core");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        flag.store(true, Ordering::Relaxed);
    });

    let stats = run(core, shutdown, None).expect("run");
    interrupter.join().expect("join interrupter");

    let calls = log.calls();
    // one engage, then exactly one final zero, then exactly one close
    assert_eq!(calls.speeds.first(), Some(&2000));
    assert_eq!(calls.speeds.iter().filter(|&&s| s == 0).count(), 1);
    assert_eq!(calls.speeds.last(), Some(&0));
    assert_eq!(calls.close_calls, 1);
    assert!(stats.cycles >= 1);
}

#[test]
fn shutdown_zero_failure_still_releases_the_handle() {
    let driver = FakeDriver::with_torque([0]);
    let log = driver.log();
    let fail = driver.fail_flag();

    let mut controller = Controller::builder()
        .with_driver(driver)
        .with_adc(ScriptedAdc::constant(3507))
        .with_buttons(factory_map())
        .with_control(ControlCfg::default())
        .with_timing(TimingCfg {
            poll_ms: 10,
            button_debounce_ms: 100,
            speed_debounce_ms: 0,
        })
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .expect("build controller");

    controller.step(); // engage
    fail.store(true, Ordering::Relaxed);

    let err = controller.shutdown().expect_err("zero-speed failure surfaces");
    assert!(format!("{err}").contains("driver error"));

    let calls = log.calls();
    assert_eq!(calls.failed_speeds, vec![0]);
    assert_eq!(calls.close_calls, 1, "close still happens exactly once");
}

#[test]
fn idle_shutdown_commands_zero_anyway() {
    // Shutting down from Idle still parks the motor explicitly; the zero
    // command is unconditional, not an optimization target.
    let driver = FakeDriver::with_torque([150]); // avg > 100 keeps it idle
    let log = driver.log();
    let mut controller = Controller::builder()
        .with_driver(driver)
        .with_adc(ScriptedAdc::constant(3507))
        .with_buttons(factory_map())
        .with_control(ControlCfg::default())
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .expect("build controller");

    controller.step();
    controller.shutdown().expect("shutdown");

    let calls = log.calls();
    assert_eq!(calls.speeds, vec![0]);
    assert_eq!(calls.close_calls, 1);
}
