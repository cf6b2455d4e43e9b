//! Human-readable error descriptions and structured JSON error formatting.

use ridewatch_core::{BuildError, DetectionError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingMotionSource => {
                "What happened: No motion source was provided to the detector.\nLikely causes: The motion sensor simulation or trace replay was not wired into the builder.\nHow to fix: Pass a source via with_motion_source(...).".to_string()
            }
            BuildError::MissingPositionProvider => {
                "What happened: No position provider was provided to the detector.\nLikely causes: The positioning collaborator was not wired into the builder.\nHow to fix: Pass a provider via with_position_provider(...).".to_string()
            }
            BuildError::MissingNetworkProvider => {
                "What happened: No network snapshot provider was provided to the detector.\nLikely causes: The Wi-Fi scanner was not wired into the builder.\nHow to fix: Pass a provider via with_network_provider(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/ridewatch.toml for a sample."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DetectionError>() {
        return match de {
            DetectionError::Terminated => "What happened: The detector was already cleaned up.\nLikely causes: start() was called after cleanup().\nHow to fix: Build a new controller for a new session.".to_string(),
            DetectionError::State(msg) => format!(
                "What happened: The detector could not change state ({msg}).\nLikely causes: The tick worker could not be spawned or did not shut down cleanly.\nHow to fix: Check system thread limits and re-run with --log-level=debug."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or trace loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("motion csv must have headers") {
        return "Invalid headers in motion CSV. Expected 'kind,x,y,z'.".to_string();
    }

    if lower.contains("invalid csv row") || lower.contains("contains no samples") {
        return format!(
            "What happened: The motion trace could not be used ({msg}).\nLikely causes: A row with an unknown kind, a missing component, or a non-finite value.\nHow to fix: Each row must be accel|gyro followed by three finite numbers."
        );
    }

    if lower.contains("open motion csv") {
        return format!(
            "What happened: The motion trace could not be opened ({msg}).\nLikely causes: Wrong path or missing read permission.\nHow to fix: Check the --motion-csv argument."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong path or missing read permission.\nHow to fix: Check the --config argument, or omit it to use the built-in defaults."
        );
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A TOML syntax error, an unknown value type, or an out-of-range setting.\nHow to fix: Edit the TOML config and try again. See etc/ridewatch.toml for a sample."
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

fn is_config_error(err: &eyre::Report) -> bool {
    if err.downcast_ref::<BuildError>().is_some() {
        return true;
    }
    let lower = format!("{err:#}").to_ascii_lowercase();
    lower.contains("parse config") || lower.contains("invalid configuration")
}

/// Stable exit codes: 2 for configuration problems, 3 for detector lifecycle
/// failures, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if is_config_error(err) {
        return 2;
    }
    if err.downcast_ref::<DetectionError>().is_some() {
        return 3;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if is_config_error(err) {
        return "InvalidConfig";
    }
    match err.downcast_ref::<DetectionError>() {
        Some(DetectionError::Terminated) => "Terminated",
        Some(DetectionError::State(_)) => "State",
        Some(_) => "Detection",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use rstest::rstest;

    #[rstest]
    #[case(eyre::Report::new(BuildError::InvalidConfig("min_detection_samples must be >= 3")), 2, "InvalidConfig")]
    #[case(eyre::Report::new(DetectionError::Terminated), 3, "Terminated")]
    #[case(eyre::Report::new(DetectionError::State("spawn failed".into())), 3, "State")]
    #[case(eyre::eyre!("disk full"), 1, "Error")]
    fn codes_and_reasons(#[case] err: eyre::Report, #[case] code: i32, #[case] reason: &str) {
        assert_eq!(exit_code_for_error(&err), code);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], reason);
        assert_eq!(v["exit_code"], code);
    }

    #[test]
    fn validation_context_is_a_config_error() {
        let err: eyre::Result<()> = Err(eyre::eyre!("timing.tick_interval_ms must be >= 1"));
        let err = err.wrap_err("invalid configuration").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 2);
        let text = humanize(&err);
        assert!(text.contains("tick_interval_ms"));
        assert!(text.starts_with("What happened: Configuration is invalid"));
    }

    #[test]
    fn csv_header_message_is_short() {
        let err = eyre::eyre!("motion CSV must have headers 'kind,x,y,z', got: a,b");
        assert_eq!(
            humanize(&err),
            "Invalid headers in motion CSV. Expected 'kind,x,y,z'."
        );
    }
}
