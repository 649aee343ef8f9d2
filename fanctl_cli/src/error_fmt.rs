//! Human-readable error descriptions and structured JSON error formatting.

use fanctl_core::error::{BuildError, FanError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No temperature sensor was provided to the controller.\nLikely causes: The sensor backend failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingPwm => {
                "What happened: No fan PWM output was provided to the controller.\nLikely causes: The PWM pin failed to initialize or was not wired into the builder.\nHow to fix: Ensure the fan output is created successfully and passed via with_pwm(...).".to_string()
            }
            BuildError::MissingTachometer => {
                "What happened: No tachometer input was provided to the controller.\nLikely causes: The tachometer pin failed to initialize or was not wired into the builder.\nHow to fix: Ensure the input is created successfully and passed via with_tachometer(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(fe) = err.downcast_ref::<FanError>() {
        return match fe {
            FanError::Init(msg) => format!(
                "What happened: The fan controller could not start ({msg}).\nLikely causes: Wrong [pins] values, missing GPIO permissions, or the PWM pin is in use.\nHow to fix: Check [pins] in the config and run with access to /dev/gpiomem. The fan was left off."
            ),
            FanError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML or a bad override.\nHow to fix: Edit the config file or the command-line value and try again."
            ),
            FanError::Sensor(msg) => format!(
                "What happened: CPU temperature could not be read ({msg}).\nLikely causes: vcgencmd missing or not permitted, or unexpected output.\nHow to fix: Run `vcgencmd measure_temp` by hand and adjust [sensor] in the config."
            ),
            FanError::Timeout => "What happened: A hardware operation timed out.\nLikely causes: Wiring or power issues.\nHow to fix: Verify the fan wiring and rerun with --log-level=debug.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 when the controller could not start, 4 for
/// configuration errors, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<FanError>() {
        Some(FanError::Init(_)) => 3,
        Some(FanError::Config(_)) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<FanError>() {
        Some(FanError::Init(_)) => "Init",
        Some(FanError::Config(_)) => "Config",
        Some(FanError::Sensor(_)) => "Sensor",
        Some(FanError::Actuator(_)) => "Actuator",
        Some(FanError::Timeout) => "Timeout",
        Some(FanError::Hardware(_) | FanError::HardwareFault(_)) => "Hardware",
        Some(FanError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
