#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and button calibration parsing for the wall rig.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The button calibration CSV loader enforces headers and known button
//!   names, overriding the static `[buttons.levels]` table when supplied.
use serde::Deserialize;

/// Button calibration CSV schema.
///
/// Expected headers:
/// button,raw
///
/// Example:
/// button,raw
/// button_2,540
/// button_4,1196
/// no_press,3507
#[derive(Debug, Deserialize, Clone)]
pub struct ButtonRow {
    pub button: String,
    pub raw: i32,
}

/// Serial/device configuration for the motor controller.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Port {
    /// Serial device path; absent means autodetect (first /dev/ttyUSB*).
    pub device: Option<String>,
    /// Path to the vendor motor-control shared library.
    pub driver_lib: Option<String>,
}

/// Which direction the torque comparison runs; wiring-dependent.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    /// Average torque above the threshold disengages the motor
    /// (excess resistance on the line).
    #[default]
    StopAbove,
    /// Average torque below the threshold engages the motor
    /// (cable slack removed pulls torque negative).
    RunBelow,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Comparison direction for the torque trigger.
    pub trigger: TriggerKind,
    /// Rolling-average torque threshold (raw sensor units).
    pub torque_threshold: i32,
    /// Initial speed setpoint (RPM).
    pub setpoint_rpm: i32,
    /// Setpoint change per qualifying button press (RPM).
    pub increment_rpm: i32,
    /// Lower setpoint clamp (RPM).
    pub min_rpm: i32,
    /// Optional upper setpoint clamp (RPM); absent means unbounded.
    pub max_rpm: Option<i32>,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            trigger: TriggerKind::StopAbove,
            torque_threshold: 100,
            setpoint_rpm: 2000,
            increment_rpm: 200,
            min_rpm: 0,
            max_rpm: Some(3000),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Rolling average window size (torque samples).
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 5 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Poll cycle interval (ms).
    pub poll_ms: u64,
    /// Minimum elapsed time between honored button-state changes (ms).
    pub button_debounce_ms: u64,
    /// Minimum elapsed time between issued speed commands (ms).
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

/// Classification strategy for the button ladder.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Closest calibrated level wins, whatever the distance.
    Nearest,
    /// First level within `tolerance` wins; otherwise no press.
    #[default]
    Tolerance,
}

/// Calibrated raw ADC level per button. Field order is the classifier's
/// table order and tie-break order.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ButtonLevels {
    pub button_1: i32,
    pub button_2: i32,
    pub button_3: i32,
    pub button_4: i32,
    pub button_5: i32,
    pub no_press: i32,
}

impl Default for ButtonLevels {
    fn default() -> Self {
        // Factory panel calibration for the five-button ladder.
        Self {
            button_1: 5,
            button_2: 540,
            button_3: 1807,
            button_4: 1196,
            button_5: 2615,
            no_press: 3507,
        }
    }
}

/// What a qualifying press of each button does.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    SpeedUp,
    SpeedDown,
    InclineUp,
    InclineDown,
    ToggleAuto,
    None,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ButtonActions {
    pub button_1: ActionKind,
    pub button_2: ActionKind,
    pub button_3: ActionKind,
    pub button_4: ActionKind,
    pub button_5: ActionKind,
}

impl Default for ButtonActions {
    fn default() -> Self {
        Self {
            button_1: ActionKind::InclineDown,
            button_2: ActionKind::SpeedUp,
            button_3: ActionKind::InclineUp,
            button_4: ActionKind::SpeedDown,
            button_5: ActionKind::ToggleAuto,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ButtonsCfg {
    pub mode: MatchMode,
    /// Tolerance window half-width for `MatchMode::Tolerance` (raw units).
    pub tolerance: i32,
    /// Sysfs path of the ADC channel carrying the button ladder.
    pub adc_path: String,
    pub levels: ButtonLevels,
    pub actions: ButtonActions,
}

impl Default for ButtonsCfg {
    fn default() -> Self {
        Self {
            mode: MatchMode::Tolerance,
            tolerance: 100,
            adc_path: "/sys/bus/iio/devices/iio:device0/in_voltage0_raw".into(),
            levels: ButtonLevels::default(),
            actions: ButtonActions::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InclineCfg {
    /// Degrees per incline button press.
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

/// Normally-closed slack sensor on a GPIO line.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InterlockCfg {
    pub enabled: bool,
    pub chip: String,
    pub line: u32,
    /// Consecutive triggered polls required before the interlock engages.
    pub debounce_n: u8,
    /// Polling interval of the background GPIO checker (ms).
    pub poll_ms: u64,
}

impl Default for InterlockCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            chip: "gpiochip0".into(),
            line: 6,
            debounce_n: 2,
            poll_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub enabled: bool,
    /// Display refresh cadence (ms); the consumer owns this.
    pub refresh_ms: u64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub port: Port,
    pub control: ControlCfg,
    pub filter: FilterCfg,
    pub timing: TimingCfg,
    pub buttons: ButtonsCfg,
    pub incline: InclineCfg,
    pub interlock: InterlockCfg,
    pub logging: Logging,
    pub display: DisplayCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Control
        if self.control.increment_rpm <= 0 {
            eyre::bail!("control.increment_rpm must be > 0");
        }
        if self.control.min_rpm < 0 {
            eyre::bail!("control.min_rpm must be >= 0");
        }
        if let Some(max) = self.control.max_rpm {
            if max < self.control.min_rpm {
                eyre::bail!("control.max_rpm must be >= control.min_rpm");
            }
            if self.control.setpoint_rpm > max {
                eyre::bail!("control.setpoint_rpm must be <= control.max_rpm");
            }
        }
        if self.control.setpoint_rpm < self.control.min_rpm {
            eyre::bail!("control.setpoint_rpm must be >= control.min_rpm");
        }

        // Filter
        if self.filter.window == 0 {
            eyre::bail!("filter.window must be >= 1");
        }
        if self.filter.window > 1024 {
            eyre::bail!("filter.window is unreasonably large (>1024)");
        }

        // Timing
        if self.timing.poll_ms == 0 {
            eyre::bail!("timing.poll_ms must be >= 1");
        }
        if self.timing.poll_ms > 10_000 {
            eyre::bail!("timing.poll_ms is unreasonably large (>10s)");
        }

        // Buttons
        if self.buttons.mode == MatchMode::Tolerance && self.buttons.tolerance <= 0 {
            eyre::bail!("buttons.tolerance must be > 0 in tolerance mode");
        }
        if self.buttons.adc_path.is_empty() {
            eyre::bail!("buttons.adc_path must not be empty");
        }

        // Incline
        if self.incline.step_deg <= 0 {
            eyre::bail!("incline.step_deg must be > 0");
        }
        if self.incline.min_deg >= self.incline.max_deg {
            eyre::bail!("incline.min_deg must be < incline.max_deg");
        }

        // Interlock
        if self.interlock.enabled {
            if self.interlock.debounce_n == 0 {
                eyre::bail!("interlock.debounce_n must be >= 1");
            }
            if self.interlock.poll_ms == 0 {
                eyre::bail!("interlock.poll_ms must be >= 1");
            }
        }

        // Display
        if self.display.enabled && self.display.refresh_ms == 0 {
            eyre::bail!("display.refresh_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Load a button calibration CSV and apply it over `levels`.
///
/// Headers must be exactly `button,raw`; button names must be one of the
/// six known identifiers. Buttons absent from the file keep their previous
/// level.
pub fn load_button_csv(
    path: &std::path::Path,
    levels: &mut ButtonLevels,
) -> eyre::Result<()> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open button calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["button", "raw"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "button calibration CSV must have headers 'button,raw', got: {}",
            actual.join(",")
        );
    }

    let mut seen = 0usize;
    for (idx, rec) in rdr.deserialize::<ButtonRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let slot = match row.button.as_str() {
            "button_1" => &mut levels.button_1,
            "button_2" => &mut levels.button_2,
            "button_3" => &mut levels.button_3,
            "button_4" => &mut levels.button_4,
            "button_5" => &mut levels.button_5,
            "no_press" => &mut levels.no_press,
            other => eyre::bail!("unknown button name '{}' at CSV row {}", other, idx + 2),
        };
        *slot = row.raw;
        seen += 1;
    }
    if seen == 0 {
        eyre::bail!("button calibration CSV {:?} contains no rows", path);
    }
    Ok(())
}
