//! Tracing subscriber setup: console layer plus optional rolling JSON file.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LEVEL: &str = "info";

/// `RUST_LOG` wins, then `--log-level`, then `[logging].level`.
fn build_filter(cli_level: Option<&str>, cfg_level: Option<&str>) -> EnvFilter {
    if let Ok(f) = EnvFilter::try_from_default_env() {
        return f;
    }
    let level = cli_level.or(cfg_level).unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

fn file_writer(cfg: &fanctl_config::Logging) -> Option<(NonBlocking, WorkerGuard)> {
    let file = cfg.file.as_deref()?;
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?;
    let appender = match cfg.rotation.as_deref() {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    Some(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. Console output goes to stderr so stdout
/// carries only command results.
///
/// The returned guard flushes the file layer when dropped; hold it until exit.
#[must_use]
pub fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &fanctl_config::Logging,
) -> Option<WorkerGuard> {
    let filter = build_filter(cli_level, cfg.level.as_deref());
    let (file_layer, guard) = match file_writer(cfg) {
        Some((w, g)) => (
            Some(fmt::layer().json().with_ansi(false).with_writer(w)),
            Some(g),
        ),
        None => (None, None),
    };
    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let res = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
    guard
}
