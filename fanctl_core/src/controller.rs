//! Threaded fan controller.
//!
//! Owns the control thread and the tachometer registration. The thread owns
//! the sensor and PWM output, runs `ControlLoop::run`, and publishes each
//! report through a single-slot channel that keeps only the newest report. The edge handler shares the estimator
//! through an `Arc`, so an edge racing with teardown never observes freed
//! state.
//!
//! Safety: each `Controller` spawns exactly one thread, which is joined on
//! `stop()` or drop. The fan is forced off by that thread before it exits.
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use fanctl_traits::{Clock, EdgeHandler, FanPwm, PulseInput, TemperatureSensor};

use crate::config::ControlCfg;
use crate::control::ControlLoop;
use crate::error::FanError;
use crate::hw_error::map_hw_error;
use crate::status::{FanReport, FanSnapshot};
use crate::tach::TachometerEstimator;

pub struct Controller {
    tach: Arc<TachometerEstimator>,
    rx: xch::Receiver<FanReport>,
    /// Cleared to request a cooperative stop
    running: Arc<AtomicBool>,
    duty: Arc<AtomicU8>,
    cycles: Arc<AtomicU64>,
    input: Box<dyn PulseInput + Send>,
    join_handle: Option<JoinHandle<()>>,
    stopped: bool,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("duty", &self.duty())
            .field("rpm", &self.rpm())
            .field("cycles", &self.cycles())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

/// Wrap an edge callback for the dispatch context. A panic inside it is
/// caught and logged; the dispatcher never sees it.
fn guard_edges(mut on_edge: impl FnMut(u32) + Send + 'static) -> EdgeHandler {
    Box::new(move |tick| {
        if catch_unwind(AssertUnwindSafe(|| on_edge(tick))).is_err() {
            tracing::error!(tick, "tachometer edge handler panicked; edge dropped");
        }
    })
}

fn edge_handler(tach: Arc<TachometerEstimator>) -> EdgeHandler {
    guard_edges(move |tick| {
        tach.on_pulse(tick);
    })
}

/// Single-slot publish where the newest report wins: a report still unread
/// from an earlier cycle is discarded.
fn publish_latest(
    tx: &xch::Sender<FanReport>,
    stale: &xch::Receiver<FanReport>,
    report: FanReport,
) {
    if let Err(xch::TrySendError::Full(report)) = tx.try_send(report) {
        let _ = stale.try_recv();
        let _ = tx.try_send(report);
    }
}

impl Controller {
    /// Initialise the actuator to duty 0, register the tachometer handler and
    /// spawn the control thread.
    ///
    /// Any failure returns `FanError::Init` with nothing left running.
    pub fn start<T, P, I, C>(
        sensor: T,
        pwm: P,
        input: I,
        clock: C,
        cfg: ControlCfg,
    ) -> Result<Self, FanError>
    where
        T: TemperatureSensor + Send + 'static,
        P: FanPwm + Send + 'static,
        I: PulseInput + Send + 'static,
        C: Clock + Send + 'static,
    {
        let mut control = ControlLoop::new(sensor, pwm, cfg.curve);
        control.begin()?;

        let tach = Arc::new(TachometerEstimator::new());
        let mut input: Box<dyn PulseInput + Send> = Box::new(input);
        if let Err(e) = input.register_falling_edge(edge_handler(tach.clone())) {
            let err = FanError::Init(format!(
                "tachometer registration failed: {}",
                map_hw_error(&*e)
            ));
            let _ = control.finish();
            return Err(err);
        }

        let (tx, rx) = xch::bounded(1);
        let stale_rx = rx.clone();
        let running = Arc::new(AtomicBool::new(true));
        let duty = Arc::new(AtomicU8::new(0));
        let cycles = Arc::new(AtomicU64::new(0));
        let interval = cfg.sample_interval;

        let thread_tach = tach.clone();
        let thread_running = running.clone();
        let thread_duty = duty.clone();
        let thread_cycles = cycles.clone();
        let spawned = std::thread::Builder::new()
            .name("fanctl-control".into())
            .spawn(move || {
                let res = catch_unwind(AssertUnwindSafe(|| {
                    control.run(
                        &thread_tach,
                        &clock,
                        interval,
                        &thread_running,
                        |outcome| {
                            thread_cycles.fetch_add(1, Ordering::Relaxed);
                            if let Ok(report) = outcome {
                                thread_duty.store(report.duty, Ordering::Relaxed);
                                publish_latest(&tx, &stale_rx, report.clone());
                            }
                        },
                    )
                }))
                .unwrap_or_else(|_| {
                    tracing::error!("control loop panicked; forcing fan off");
                    control.finish()
                });
                thread_duty.store(control.duty(), Ordering::Relaxed);
                if let Err(e) = res {
                    tracing::error!(error = %e, "control thread exited with error");
                }
                tracing::trace!("control thread exiting cleanly");
            });

        let join_handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                let _ = input.deregister();
                return Err(FanError::Init(format!("spawn control thread: {e}")));
            }
        };

        tracing::info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "fan controller started"
        );
        Ok(Self {
            tach,
            rx,
            running,
            duty,
            cycles,
            input,
            join_handle: Some(join_handle),
            stopped: false,
        })
    }

    /// Latest RPM estimate.
    pub fn rpm(&self) -> f64 {
        self.tach.read_rpm()
    }

    /// Duty currently applied by the control thread.
    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Relaxed)
    }

    /// Control iterations completed (including failed ones).
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.stopped && self.running.load(Ordering::Relaxed)
    }

    /// Shared handle to the estimator fed by the tachometer.
    pub fn tachometer(&self) -> &Arc<TachometerEstimator> {
        &self.tach
    }

    /// Newest report not yet taken, if any.
    pub fn latest_report(&self) -> Option<FanReport> {
        self.rx.try_iter().last()
    }

    pub fn snapshot(&self) -> FanSnapshot {
        FanSnapshot {
            duty: self.duty(),
            rpm: self.rpm(),
            cycles: self.cycles(),
        }
    }

    /// Request a cooperative stop and wait for it.
    ///
    /// Returns after the control thread has forced the fan off (at most one
    /// sample interval) and the tachometer handler has been removed.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) -> Result<(), FanError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.running.store(false, Ordering::Release);

        let mut result = Ok(());
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "control thread panicked during shutdown");
            result = Err(FanError::State("control thread panicked".into()));
        }

        if let Err(e) = self.input.deregister() {
            let err = map_hw_error(&*e);
            tracing::warn!(error = %err, "failed to deregister tachometer handler");
            if result.is_ok() {
                result = Err(err);
            }
        }
        tracing::info!("fan controller stopped");
        result
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "controller shutdown incomplete");
        }
    }
}
