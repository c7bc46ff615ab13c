//! Human-readable error descriptions and structured JSON error formatting.

use cover_core::error::{BuildError, CoverError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CoverError>() {
        return match ce {
            CoverError::UnknownCover(id) => format!(
                "What happened: No cover named {id:?} is configured.\nLikely causes: Typo in the cover id, or the cover uses a unique_id different from its table key.\nHow to fix: Run `relay-cover status` to list the configured ids."
            ),
            CoverError::StoreCorrupt(msg) => format!(
                "What happened: The position store could not be read ({msg}).\nLikely causes: The JSON document was edited by hand, truncated, or written by another integration.\nHow to fix: Fix or delete the file named in [store] path, then run `relay-cover calibrate <cover>` to re-anchor positions."
            ),
            CoverError::Store(msg) => format!(
                "What happened: The position store is not accessible ({msg}).\nLikely causes: Missing directory, read-only filesystem, or insufficient permissions.\nHow to fix: Check [store] path in the config and the permissions of its directory."
            ),
            CoverError::Publish(msg) => format!(
                "What happened: A command could not be published ({msg}).\nLikely causes: The transport is down or the spool directory is missing.\nHow to fix: Check the [transport] section and run `relay-cover self-check`."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: Internal wiring error.\nHow to fix: Re-run with --log-level=debug and report the output."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("invalid configuration") {
        return format!(
            "What happened: {msg}.\nLikely causes: {}\nHow to fix: Edit the TOML config and try again. Check the --config path if the file could not be read.",
            err.root_cause()
        );
    }

    if lower.contains("not available") {
        return format!(
            "What happened: The command transport is not available ({msg}).\nLikely causes: The spool directory does not exist or the bridge is not running.\nHow to fix: Create the directory of transport.spool_path or switch to kind = \"sim\"."
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

/// Stable exit codes: 3 unknown cover, 4 store failure, 1 anything else.
/// Usage errors exit with 2 from clap before we get here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<CoverError>() {
        Some(CoverError::UnknownCover(_)) => 3,
        Some(CoverError::Store(_) | CoverError::StoreCorrupt(_)) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<CoverError>() {
        Some(CoverError::UnknownCover(_)) => "UnknownCover",
        Some(CoverError::Store(_)) => "Store",
        Some(CoverError::StoreCorrupt(_)) => "StoreCorrupt",
        Some(CoverError::Publish(_)) => "Publish",
        None if err.downcast_ref::<BuildError>().is_some() => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_cover_maps_to_exit_3() {
        let err = eyre::Report::new(CoverError::UnknownCover("attic".into()));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("\"attic\""));
    }

    #[test]
    fn wrapped_store_errors_map_to_exit_4() {
        let err = eyre::Report::new(CoverError::StoreCorrupt("bad json".into()))
            .wrap_err("load covers");
        assert_eq!(exit_code_for_error(&err), 4);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).expect("json");
        assert_eq!(v["reason"], "StoreCorrupt");
        assert_eq!(v["exit_code"], 4);
    }

    #[test]
    fn plain_errors_fall_back_to_generic() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("Original: boom"));
    }
}
