#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `fanctl`: closed-loop CPU fan controller.

mod cli;
mod error_fmt;
mod logging;
mod run;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::Result;
use fanctl_core::FanError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn install_ctrlc(shutdown: &Arc<AtomicBool>) {
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler; stop with SIGKILL only");
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = fanctl_config::load_file(&cli.config)
        .map_err(|e| FanError::Config(format!("{e:#}")))?;

    // Dropped at the end of this function, flushing the log file
    let _log_guard = logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            interval_ms,
            cycles,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            install_ctrlc(&shutdown);
            run::run_fan(&cfg, interval_ms, cycles, cli.json, shutdown)
        }
        Commands::Curve { temp_f } => run::show_curve(&cfg, temp_f, cli.json),
        Commands::SelfCheck => run::self_check(&cfg, cli.json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre install failed: {e}");
    }

    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            // exit codes are small positive values
            ExitCode::from(u8::try_from(exit_code_for_error(&e)).unwrap_or(1))
        }
    }
}
