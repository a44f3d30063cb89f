//! Human-readable error descriptions and structured JSON error formatting.

use thermo_core::error::{BuildError, ConfigurationError, InvalidSampleError};

/// Failures the CLI detects itself before the controller sees any input.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid trace: {0}")]
    Trace(String),
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A typo in a key, a wrong value type, or out-of-range values in the TOML.\nHow to fix: Edit the config file and run `thermo check-config` until it passes."
            ),
            CliError::Trace(msg) => format!(
                "What happened: The signal trace could not be read ({msg}).\nLikely causes: Wrong header order, a non-numeric cell, or an unknown on/off value.\nHow to fix: Use the header timestamp_ms,room_c,setpoint_c,hvac_on,window_open,actuator_c and leave cells empty for missing values."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ConfigurationError>() {
        return format!(
            "What happened: The controller rejected its parameters ({ce}).\nLikely causes: Values that pass the schema but contradict each other.\nHow to fix: Adjust the named fields in the config file."
        );
    }

    if let Some(se) = err.downcast_ref::<InvalidSampleError>() {
        let causes = match se {
            InvalidSampleError::NonPositiveDt { .. } | InvalidSampleError::ClockWentBackwards { .. } => {
                "Trace rows out of order, or a sensor clock that jumped backwards."
            }
            InvalidSampleError::ConflictingDuplicate { .. } => {
                "Two rows with the same timestamp but different room temperatures."
            }
            InvalidSampleError::NonFiniteTemperature(_)
            | InvalidSampleError::NonFiniteSetpoint(_)
            | InvalidSampleError::NonFiniteActuatorSetpoint(_) => {
                "A NaN or infinite value in the trace."
            }
        };
        return format!(
            "What happened: A cycle input was rejected ({se}).\nLikely causes: {causes}\nHow to fix: Clean the trace; the controller state is unchanged by a rejected cycle."
        );
    }

    if let Some(BuildError::PersistedState(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: The saved controller state is unusable ({msg}).\nLikely causes: The state file was edited by hand or truncated.\nHow to fix: Delete the state file; the bias will be learned again."
        );
    }

    // String-based heuristics
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("state file") {
        return format!(
            "What happened: {msg}.\nLikely causes: Missing directory or insufficient permissions.\nHow to fix: Point [persistence] state_file or --state at a writable location."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 configuration, 4 invalid sample or trace, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigurationError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<InvalidSampleError>().is_some() {
        return 4;
    }
    match err.downcast_ref::<CliError>() {
        Some(CliError::Config(_)) => 3,
        Some(CliError::Trace(_)) => 4,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(_) => "ConfigurationError",
            CliError::Trace(_) => "TraceError",
        };
    }
    if err.downcast_ref::<ConfigurationError>().is_some() {
        return "ConfigurationError";
    }
    if err.downcast_ref::<InvalidSampleError>().is_some() {
        return "InvalidSample";
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "PersistedState";
    }
    "Error"
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
