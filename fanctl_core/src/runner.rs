use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::builder::{ControllerBuilder, Set};
use crate::error::Result as CoreResult;
use crate::status::{FanReport, FanSnapshot};

/// How often the supervisor checks the shutdown flag and drains reports.
const SUPERVISE_POLL: Duration = Duration::from_millis(20);

/// Bounds on a supervised run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Stop after this many control iterations; `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

#[inline]
fn limit_reached(cycles: u64, max_cycles: Option<u64>) -> bool {
    max_cycles.is_some_and(|max| cycles >= max)
}

/// Start the controller and supervise it until `shutdown` is raised or the
/// cycle limit is reached, then stop it and return the final snapshot.
///
/// `on_report` sees the latest report available at each poll; reports
/// produced faster than the poll are coalesced. The returned snapshot is
/// taken after shutdown, so its duty is 0.
pub fn run(
    builder: ControllerBuilder<Set, Set, Set>,
    shutdown: Arc<AtomicBool>,
    limits: RunLimits,
    mut on_report: impl FnMut(&FanReport),
) -> CoreResult<FanSnapshot> {
    let mut controller = builder.start()?;
    tracing::info!(max_cycles = ?limits.max_cycles, "fan control start");

    loop {
        if let Some(report) = controller.latest_report() {
            on_report(&report);
        }
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if limit_reached(controller.cycles(), limits.max_cycles) {
            tracing::info!(cycles = controller.cycles(), "cycle limit reached");
            break;
        }
        std::thread::sleep(SUPERVISE_POLL);
    }

    controller.stop()?;
    if let Some(report) = controller.latest_report() {
        on_report(&report);
    }
    let snap = controller.snapshot();
    tracing::info!(cycles = snap.cycles, rpm = snap.rpm.round(), "fan control stop");
    Ok(snap)
}
