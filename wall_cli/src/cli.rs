//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Default config location; when the file is absent the built-in defaults
/// apply with a warning instead of failing startup.
pub const DEFAULT_CONFIG: &str = "etc/wallctl.toml";

#[derive(Parser, Debug)]
#[command(name = "wallctl", version, about = "Climbing wall motor rig control")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Optional button calibration CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines and print a JSON result object
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(
        long = "log-level",
        global = true,
        value_name = "LEVEL",
        default_value = "info"
    )]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the torque-triggered speed control loop
    Run {
        /// USB serial port (default: config value, else vendor autodetect)
        #[arg(long, short = 'p', value_name = "PORT")]
        port: Option<String>,

        /// Torque threshold in raw sensor units (default: config, 100)
        #[arg(long, short = 't', allow_hyphen_values = true)]
        threshold: Option<i32>,

        /// Initial speed setpoint in RPM (default: config, 2000)
        #[arg(long, short = 's')]
        speed: Option<i32>,

        /// Setpoint change per button press in RPM (default: config, 200)
        #[arg(long, short = 'i')]
        increment: Option<i32>,

        /// Stop after this many milliseconds (default: run until interrupted)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,

        /// Do not spawn the display updater thread
        #[arg(long, action = ArgAction::SetTrue)]
        no_display: bool,
    },

    /// Continuously print raw and rolling-average torque
    Monitor {
        /// Delay between readings (ms)
        #[arg(long, value_name = "MS", default_value_t = 100)]
        interval_ms: u64,

        /// Rolling average window size (samples)
        #[arg(long, default_value_t = 5)]
        window: usize,
    },

    /// One-shot speed setpoint write (clears faults first)
    SetSpeed {
        /// Setpoint in RPM (0 stops the motor)
        #[arg(long, short = 's', allow_hyphen_values = true)]
        rpm: i32,
    },

    /// Interactively sample the button ladder into a calibration CSV
    CalibrateButtons {
        /// Output CSV path
        #[arg(long, value_name = "FILE", default_value = "button_calibration.csv")]
        output: PathBuf,

        /// ADC samples averaged per button
        #[arg(long, default_value_t = 20)]
        samples: u32,
    },
}
