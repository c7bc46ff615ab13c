//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "relay-cover", version, about = "Relay cover controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/relay_cover.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a cover fully open
    Open {
        /// Cover id (config key or unique_id)
        cover: String,
    },
    /// Drive a cover fully closed
    Close { cover: String },
    /// Publish STOP and leave the estimate where it is
    Stop { cover: String },
    /// Move a cover to a position in percent (0 closed, 100 open; clamped)
    SetPosition {
        cover: String,
        #[arg(allow_negative_numbers = true)]
        position: i32,
    },
    /// Run both travel limits and re-anchor the estimate at closed
    Calibrate { cover: String },
    /// Print the persisted state of one or all covers
    Status { cover: Option<String> },
    /// Validate config and probe the transport and position store
    SelfCheck,
}
