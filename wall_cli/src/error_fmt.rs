//! Human-readable error descriptions and structured JSON error formatting.

use wall_core::error::{BuildError, RigError};

/// Map an eyre::Report to a short explanation with likely causes and fix
/// hints. Startup failures are the only class that reaches this path during
/// normal operation; everything later is logged and survived.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDriver => {
                "What happened: No motor driver was provided to the control loop.\nLikely causes: The vendor library failed to open or was not wired into the builder.\nHow to fix: Check the driver library path in [port] and the controller's USB connection.".to_string()
            }
            BuildError::MissingAdc => {
                "What happened: No ADC source was provided to the control loop.\nLikely causes: The button ladder path is wrong or the IIO overlay is not enabled.\nHow to fix: Check buttons.adc_path in the config and enable the ADC overlay.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RigError>() {
        return match re {
            RigError::DriverFault(msg) => format!(
                "What happened: The drive reported a fault ({msg}).\nLikely causes: Latched fault from a previous run, or the drive lost power.\nHow to fix: Power-cycle the controller and retry; faults are cleared automatically at startup."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("permission denied") && lower.contains("tty") {
        return "What happened: The serial port exists but is not accessible.\nLikely causes: Your user is not in the dialout group.\nHow to fix: sudo usermod -a -G dialout $USER, then log out and back in.".to_string();
    }

    if lower.contains("does not exist") && lower.contains("port") {
        return "What happened: The configured serial port was not found.\nLikely causes: USB cable unplugged or a different ttyUSB number was assigned.\nHow to fix: Check the connection, or omit --port to let the vendor library autodetect.".to_string();
    }

    if lower.contains("open motor controller") || lower.contains("driver library") {
        return "What happened: The vendor motor-control library could not be loaded or found no controller.\nLikely causes: libsimucube.so missing from the library path, or the controller is powered off.\nHow to fix: Set port.driver_lib to the library's full path and verify the controller enumerates as a USB serial device.".to_string();
    }

    if lower.contains("config") {
        return format!(
            "What happened: {msg}.\nLikely causes: Malformed TOML or out-of-range values.\nHow to fix: Fix the reported key and rerun."
        );
    }

    format!("What happened: {msg}.\nHow to fix: Re-run with --log-level=debug for more detail.")
}

/// Print the error for the selected output mode.
pub fn emit(err: &eyre::Report, json: bool) {
    if json {
        let payload = serde_json::json!({
            "ok": false,
            "error": err.to_string(),
            "detail": humanize(err),
        });
        eprintln!("{payload}");
    } else {
        eprintln!("error: {err:#}");
        eprintln!("{}", humanize(err));
    }
}
