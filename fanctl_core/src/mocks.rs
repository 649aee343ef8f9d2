//! Test and helper mocks for fanctl_core

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fanctl_traits::{BoxError, EdgeHandler, FanPwm, PulseInput, TemperatureSensor};

/// A sensor that always errors on read.
pub struct NoopSensor;

impl TemperatureSensor for NoopSensor {
    fn read_fahrenheit(&mut self) -> Result<f64, BoxError> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// Replays a fixed script of readings; `None` entries and an exhausted
/// script read as errors.
pub struct ScriptedSensor {
    script: VecDeque<Option<f64>>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Script of successful readings only.
    pub fn temps(temps: impl IntoIterator<Item = f64>) -> Self {
        Self::new(temps.into_iter().map(Some))
    }
}

impl TemperatureSensor for ScriptedSensor {
    fn read_fahrenheit(&mut self) -> Result<f64, BoxError> {
        match self.script.pop_front() {
            Some(Some(t)) => Ok(t),
            Some(None) => Err(Box::new(std::io::Error::other("scripted sensor failure"))),
            None => Err(Box::new(std::io::Error::other("sensor script exhausted"))),
        }
    }
}

/// Fan output recording every successful duty write; clones share state.
#[derive(Clone, Default)]
pub struct RecordingFan {
    writes: Arc<Mutex<Vec<u8>>>,
    fail_remaining: Arc<AtomicUsize>,
    always_fail: bool,
}

impl RecordingFan {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fan whose every write fails.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// Make the next `n` writes fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::Relaxed);
    }

    pub fn writes(&self) -> Vec<u8> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl FanPwm for RecordingFan {
    fn set_duty_cycle(&mut self, level: u8) -> Result<(), BoxError> {
        if self.always_fail {
            return Err(Box::new(std::io::Error::other("pwm write failed")));
        }
        let pending = self.fail_remaining.load(Ordering::Relaxed);
        if pending > 0 {
            self.fail_remaining.store(pending - 1, Ordering::Relaxed);
            return Err(Box::new(std::io::Error::other("pwm write failed")));
        }
        if let Ok(mut w) = self.writes.lock() {
            w.push(level);
        }
        Ok(())
    }
}

/// Pulse input whose edges are fired by hand from the test thread.
#[derive(Clone, Default)]
pub struct ManualPulseInput {
    handler: Arc<Mutex<Option<EdgeHandler>>>,
    refuse: Arc<AtomicBool>,
}

impl ManualPulseInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input that rejects registration.
    pub fn refusing() -> Self {
        let input = Self::default();
        input.refuse.store(true, Ordering::Relaxed);
        input
    }

    /// Deliver one falling edge; returns false when no handler is registered.
    pub fn fire(&self, tick: u32) -> bool {
        match self.handler.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(h) => {
                    h(tick);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.handler.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

impl PulseInput for ManualPulseInput {
    fn register_falling_edge(&mut self, handler: EdgeHandler) -> Result<(), BoxError> {
        if self.refuse.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("edge registration refused")));
        }
        if let Ok(mut g) = self.handler.lock() {
            *g = Some(handler);
        }
        Ok(())
    }

    fn deregister(&mut self) -> Result<(), BoxError> {
        if let Ok(mut g) = self.handler.lock() {
            *g = None;
        }
        Ok(())
    }
}
