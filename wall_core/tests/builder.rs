use wall_core::error::BuildError;
use wall_core::mocks::{FakeDriver, ScriptedAdc};
use wall_core::{ControlCfg, Controller, ControllerBuilder, Missing};

#[test]
fn try_build_without_driver_reports_what_is_missing() {
    let builder: ControllerBuilder<Missing, Missing> = Controller::builder();
    let err = builder.try_build().expect_err("nothing provided");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingDriver)
    ));
}

#[test]
fn try_build_without_adc_reports_what_is_missing() {
    let err = Controller::builder()
        .with_driver(FakeDriver::default())
        .try_build()
        .expect_err("adc missing");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingAdc)
    ));
}

#[test]
fn zero_increment_is_rejected() {
    let err = Controller::builder()
        .with_driver(FakeDriver::default())
        .with_adc(ScriptedAdc::constant(3507))
        .with_control(ControlCfg {
            increment_rpm: 0,
            ..ControlCfg::default()
        })
        .build()
        .expect_err("increment 0 invalid");
    let msg = format!("{err}");
    assert!(msg.contains("increment_rpm"), "unexpected error: {msg}");
}

#[test]
fn setpoint_outside_the_clamp_is_rejected() {
    let err = Controller::builder()
        .with_driver(FakeDriver::default())
        .with_adc(ScriptedAdc::constant(3507))
        .with_control(ControlCfg {
            setpoint_rpm: 5000,
            max_rpm: Some(3000),
            ..ControlCfg::default()
        })
        .build()
        .expect_err("setpoint above max invalid");
    assert!(format!("{err}").contains("setpoint_rpm"));
}

#[test]
fn zero_window_is_rejected_by_the_builder() {
    let err = Controller::builder()
        .with_driver(FakeDriver::default())
        .with_adc(ScriptedAdc::constant(3507))
        .with_window(0)
        .build()
        .expect_err("window 0 invalid");
    assert!(format!("{err}").contains("window"));
}

#[test]
fn defaults_build_and_start_idle() {
    let controller = Controller::builder()
        .with_driver(FakeDriver::default())
        .with_adc(ScriptedAdc::constant(3507))
        .build()
        .expect("defaults are valid");
    let snap = controller.snapshot();
    assert_eq!(snap.target_rpm, 2000);
    assert_eq!(snap.commanded_rpm, 0);
    assert!(!snap.running);
}
