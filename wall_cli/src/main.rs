//! wallctl — control binary for the climbing wall motor rig.

mod cli;
mod error_fmt;
mod run;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};

fn main() -> ExitCode {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match real_main(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error_fmt::emit(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(cli)?;
    init_tracing(cli, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(shutdown.clone())?;

    match &cli.cmd {
        Commands::Run {
            port,
            threshold,
            speed,
            increment,
            duration_ms,
            no_display,
        } => {
            let overrides = run::RunOverrides {
                port: port.clone(),
                threshold: *threshold,
                speed: *speed,
                increment: *increment,
                duration_ms: *duration_ms,
                no_display: *no_display,
            };
            let (stats, snapshot) = run::run_loop(&cfg, &overrides, shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "cycles": stats.cycles,
                        "commands": stats.commands,
                        "failed_commands": stats.failed_commands,
                        "skipped_reads": stats.skipped_reads,
                        "target_rpm": snapshot.target_rpm,
                        "incline_deg": snapshot.incline_deg,
                        "auto_mode": snapshot.auto_mode,
                        "running": snapshot.running,
                    })
                );
            } else {
                println!(
                    "run finished: {} cycles, {} commands ({} failed), {} skipped reads",
                    stats.cycles, stats.commands, stats.failed_commands, stats.skipped_reads
                );
            }
            Ok(())
        }
        Commands::Monitor {
            interval_ms,
            window,
        } => run::monitor(&cfg, *interval_ms, *window, shutdown),
        Commands::SetSpeed { rpm } => {
            run::set_speed_once(&cfg, *rpm)?;
            if cli.json {
                println!("{}", serde_json::json!({ "ok": true, "rpm": rpm }));
            } else {
                println!("speed set to {rpm} RPM");
            }
            Ok(())
        }
        Commands::CalibrateButtons { output, samples } => {
            run::calibrate_buttons(&cfg, output, *samples)
        }
    }
}

/// Load and validate the TOML config, then fold in the optional calibration
/// CSV. A missing file is fatal unless it is the untouched default path, in
/// which case the built-in defaults apply.
fn load_config(cli: &Cli) -> eyre::Result<wall_config::Config> {
    let mut cfg = if cli.config.exists() {
        let text = std::fs::read_to_string(&cli.config)
            .wrap_err_with(|| format!("reading config {}", cli.config.display()))?;
        wall_config::load_toml(&text)
            .map_err(|e| eyre::eyre!("parsing config {}: {e}", cli.config.display()))?
    } else if cli.config == std::path::Path::new(DEFAULT_CONFIG) {
        eprintln!("config {DEFAULT_CONFIG} not found; using built-in defaults");
        wall_config::Config::default()
    } else {
        eyre::bail!("config file {} does not exist", cli.config.display());
    };
    cfg.validate()
        .wrap_err_with(|| format!("invalid config {}", cli.config.display()))?;

    if let Some(csv) = &cli.calibration {
        wall_config::load_button_csv(csv, &mut cfg.buttons.levels)
            .wrap_err_with(|| format!("loading button calibration {}", csv.display()))?;
        tracing::debug!(path = %csv.display(), "button calibration applied");
    }
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &wall_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, registry};

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));

    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();
    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    layers.push(console);

    if let Some(file) = &logging.file {
        let path = std::path::Path::new(file);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "wallctl.log".into());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter =
            EnvFilter::new(logging.level.clone().unwrap_or_else(|| "info".into()));
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    registry().with(layers).init();
    Ok(())
}

fn install_interrupt_handler(shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    ctrlc::set_handler(move || {
        if shutdown.swap(true, Ordering::Relaxed) {
            // Second interrupt while the shutdown sequence runs: hard exit.
            std::process::exit(130);
        }
        eprintln!("\ninterrupt received; stopping...");
    })
    .wrap_err("installing interrupt handler")
}
