//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Environment override for the simulated CPU temperature (°F).
pub const SIM_TEMP_ENV: &str = "FANCTL_SIM_TEMP_F";

#[derive(Parser, Debug)]
#[command(name = "fanctl", version, about = "Raspberry Pi CPU fan controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/fanctl.toml")]
    pub config: PathBuf,

    /// Log and print as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the closed-loop controller until Ctrl-C
    Run {
        /// Override control.sample_interval_ms
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Stop after this many control iterations
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
    },
    /// Print the duty the configured curve assigns to a temperature
    Curve {
        /// Temperature in °F
        #[arg(long = "temp-f", value_name = "F", allow_negative_numbers = true)]
        temp_f: f64,
    },
    /// Read the temperature once and show the target duty (hardware presence / sim ok)
    SelfCheck,
}
