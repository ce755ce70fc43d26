//! Hardware assembly and subcommand execution.

use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[cfg(feature = "hardware")]
use eyre::WrapErr;

use wall_core::error::Result as CoreResult;
use wall_core::runner::RunStats;
use wall_core::{
    ButtonMap, ControlCfg, InclineCfg, RollingAverage, StateSnapshot, TimingCfg, TorqueTrigger,
};
use wall_traits::{AdcSource, MotorDriver};

/// Build the driver/ADC pair: real hardware with the `hardware` feature,
/// simulated rig otherwise.
#[allow(unused_variables)]
pub fn assemble_hardware(
    cfg: &wall_config::Config,
    port: Option<&str>,
) -> CoreResult<(Box<dyn MotorDriver>, Box<dyn AdcSource>)> {
    #[cfg(feature = "hardware")]
    {
        if let Some(port) = port.or(cfg.port.device.as_deref()) {
            check_port(port)?;
        }
        let lib = cfg
            .port
            .driver_lib
            .clone()
            .unwrap_or_else(|| wall_hardware::DEFAULT_DRIVER_LIB.to_string());
        let driver = wall_hardware::SimucubeDriver::open(&lib)
            .wrap_err_with(|| format!("open motor controller via {lib}"))?;
        let adc = wall_hardware::SysfsAdc::open(&cfg.buttons.adc_path);
        Ok((Box::new(driver), Box::new(adc)))
    }
    #[cfg(not(feature = "hardware"))]
    {
        tracing::info!("hardware feature off; using simulated rig");
        Ok((
            Box::new(wall_hardware::SimulatedDriver::new()),
            Box::new(wall_hardware::SimulatedAdc::new()),
        ))
    }
}

/// Fail fast with a useful diagnostic when the configured port is missing or
/// not accessible; both are startup-fatal classes.
#[cfg(feature = "hardware")]
fn check_port(port: &str) -> CoreResult<()> {
    use std::path::Path;
    if !Path::new(port).exists() {
        eyre::bail!("port {port} does not exist; check the USB connection");
    }
    let readable = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(port)
        .is_ok();
    if !readable {
        eyre::bail!(
            "permission denied for {port}; add your user to the dialout group \
             (sudo usermod -a -G dialout $USER) or run with elevated privileges"
        );
    }
    Ok(())
}

pub struct RunOverrides {
    pub port: Option<String>,
    pub threshold: Option<i32>,
    pub speed: Option<i32>,
    pub increment: Option<i32>,
    pub duration_ms: Option<u64>,
    pub no_display: bool,
}

/// Assemble, initialize, and run the control loop until interrupted or the
/// optional deadline passes. Returns the run counters and the final state.
pub fn run_loop(
    cfg: &wall_config::Config,
    overrides: &RunOverrides,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<(RunStats, StateSnapshot)> {
    let (mut driver, adc) = assemble_hardware(cfg, overrides.port.as_deref())?;

    // Startup-fatal initialization: enable the drive and park it at zero.
    driver
        .clear_faults()
        .map_err(|e| box_err("clearing faults", e))?;
    driver
        .set_speed(0)
        .map_err(|e| box_err("initial zero-speed command", e))?;

    let mut control = ControlCfg::from(&cfg.control);
    if let Some(t) = overrides.threshold {
        control.trigger = match control.trigger {
            TorqueTrigger::StopAbove(_) => TorqueTrigger::StopAbove(t),
            TorqueTrigger::RunBelow(_) => TorqueTrigger::RunBelow(t),
        };
    }
    if let Some(s) = overrides.speed {
        control.setpoint_rpm = s;
    }
    if let Some(i) = overrides.increment {
        control.increment_rpm = i;
    }
    let timing = TimingCfg::from(&cfg.timing);
    let incline = InclineCfg::from(&cfg.incline);
    let map = ButtonMap::from(&cfg.buttons);

    // Display side: change events over a bounded channel plus the snapshot
    // under the one shared lock. The snapshot is kept even without a display
    // so the final state can be reported.
    let shared = wall_core::state::shared_snapshot();
    let (events, updater) = if cfg.display.enabled && !overrides.no_display {
        let (tx, rx) = crossbeam_channel::bounded(32);
        let updater =
            wall_display::Updater::spawn(rx, wall_display::ConsoleSink, cfg.display.refresh_ms);
        (Some(tx), Some(updater))
    } else {
        (None, None)
    };

    let interlock = make_interlock(cfg);

    let core = wall_core::build_core(
        driver,
        adc,
        map,
        control,
        timing,
        incline,
        cfg.filter.window,
        interlock,
        events,
        Some(shared.clone()),
        None,
    )?;

    let stats = wall_core::runner::run(core, shutdown, overrides.duration_ms)?;
    drop(updater); // joins the display thread

    let snapshot = shared.lock().map(|g| *g).unwrap_or_default();
    Ok((stats, snapshot))
}

#[allow(unused_variables)]
fn make_interlock(cfg: &wall_config::Config) -> Option<(Box<dyn Fn() -> bool>, u8)> {
    if !cfg.interlock.enabled {
        return None;
    }
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        match wall_hardware::make_slack_checker(
            &cfg.interlock.chip,
            cfg.interlock.line,
            cfg.interlock.poll_ms,
        ) {
            Ok(check) => {
                tracing::info!(
                    chip = %cfg.interlock.chip,
                    line = cfg.interlock.line,
                    "slack interlock enabled"
                );
                let boxed: Box<dyn Fn() -> bool> = Box::new(move || check());
                return Some((boxed, cfg.interlock.debounce_n));
            }
            Err(e) => {
                tracing::warn!(error = %e, "slack interlock init failed; continuing without it");
                return None;
            }
        }
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        tracing::warn!("interlock configured but hardware support is compiled out");
        None
    }
}

/// `monitor`: live raw + averaged torque readout.
pub fn monitor(
    cfg: &wall_config::Config,
    interval_ms: u64,
    window: usize,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<()> {
    let (mut driver, _adc) = assemble_hardware(cfg, None)?;
    let mut avg = RollingAverage::new(window);
    let period = Duration::from_millis(interval_ms.max(1));

    println!("monitoring torque; interrupt to stop");
    while !shutdown.load(Ordering::Relaxed) {
        match driver.torque() {
            Ok(t) => {
                avg.push(t);
                print!("torque {t:6}  avg {:8.2}\r", avg.average());
                let _ = std::io::stdout().flush();
            }
            Err(e) => {
                tracing::warn!(error = %e, "torque read failed");
            }
        }
        std::thread::sleep(period);
    }
    println!();
    driver.close().map_err(|e| box_err("closing driver", e))?;
    Ok(())
}

/// `set-speed`: clear faults, write one setpoint, release the handle.
pub fn set_speed_once(cfg: &wall_config::Config, rpm: i32) -> CoreResult<()> {
    let (mut driver, _adc) = assemble_hardware(cfg, None)?;
    driver
        .clear_faults()
        .map_err(|e| box_err("clearing faults", e))?;
    driver
        .set_speed(rpm)
        .map_err(|e| box_err(&format!("setting speed to {rpm} RPM"), e))?;
    tracing::info!(rpm, "speed setpoint written");
    driver.close().map_err(|e| box_err("closing driver", e))?;
    Ok(())
}

/// `calibrate-buttons`: prompt per button, average ADC samples, write CSV.
pub fn calibrate_buttons(
    cfg: &wall_config::Config,
    output: &std::path::Path,
    samples: u32,
) -> CoreResult<()> {
    let (_driver, mut adc) = assemble_hardware(cfg, None)?;
    let samples = samples.max(1);
    let stdin = std::io::stdin();
    let mut rows: Vec<(String, i32)> = Vec::new();

    for id in wall_core::ButtonId::ALL {
        let label = id.label();
        if id == wall_core::ButtonId::NoPress {
            println!("Release all buttons, then press Enter...");
        } else {
            println!("Hold {label}, then press Enter...");
        }
        let mut line = String::new();
        stdin
            .read_line(&mut line)
            .map_err(|e| eyre::eyre!("reading stdin: {e}"))?;

        let mut sum: i64 = 0;
        let mut good: u32 = 0;
        for _ in 0..samples {
            if let Ok(v) = adc.read() {
                sum += i64::from(v);
                good += 1;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        if good == 0 {
            eyre::bail!("no ADC samples succeeded while calibrating {label}");
        }
        let level = (sum / i64::from(good)) as i32;
        println!("  {label}: {level} ({good}/{samples} samples)");
        rows.push((label.to_string(), level));
    }

    let mut wtr = csv::Writer::from_path(output)
        .map_err(|e| eyre::eyre!("create {output:?}: {e}"))?;
    wtr.write_record(["button", "raw"])
        .map_err(|e| eyre::eyre!("write CSV header: {e}"))?;
    for (button, raw) in &rows {
        wtr.write_record([button.as_str(), &raw.to_string()])
            .map_err(|e| eyre::eyre!("write CSV row: {e}"))?;
    }
    wtr.flush().map_err(|e| eyre::eyre!("flush CSV: {e}"))?;
    println!("calibration written to {}", output.display());
    Ok(())
}

fn box_err(context: &str, e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    eyre::eyre!("{context}: {e}")
}
