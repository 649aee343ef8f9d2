//! Device implementations behind the `fanctl_traits` seams.
//!
//! Simulated devices are always available; the Raspberry Pi GPIO backend is
//! compiled with the `hardware` feature on Linux.
pub mod error;
pub mod thermal;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use fanctl_traits::{
    BoxError, EdgeHandler, FanPwm, MonotonicTicks, PulseInput, TemperatureSensor, TickSource,
};

pub use thermal::VcgencmdSensor;

/// Simulated temperature sensor reporting a settable value in °F.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    temp_bits: Arc<AtomicU64>,
}

impl SimulatedSensor {
    pub fn new(temp_f: f64) -> Self {
        Self {
            temp_bits: Arc::new(AtomicU64::new(temp_f.to_bits())),
        }
    }

    /// Change the reported temperature; visible to every clone.
    pub fn set(&self, temp_f: f64) {
        self.temp_bits.store(temp_f.to_bits(), Ordering::Relaxed);
    }
}

impl TemperatureSensor for SimulatedSensor {
    fn read_fahrenheit(&mut self) -> Result<f64, BoxError> {
        Ok(f64::from_bits(self.temp_bits.load(Ordering::Relaxed)))
    }
}

/// Simulated PWM output. The current duty is shared so a `SimulatedTach`
/// can spin proportionally.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFan {
    duty: Arc<AtomicU8>,
    writes: Arc<AtomicU64>,
}

impl SimulatedFan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Relaxed)
    }

    /// Number of duty writes (including `off`).
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Build a tachometer that follows this fan's duty.
    pub fn tachometer(&self, max_rpm: f64) -> SimulatedTach {
        SimulatedTach::new(self.duty.clone(), max_rpm)
    }
}

impl FanPwm for SimulatedFan {
    fn set_duty_cycle(&mut self, level: u8) -> Result<(), BoxError> {
        self.duty.store(level, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(level, "pwm duty set (simulated)");
        Ok(())
    }
}

/// Simulated tachometer: a background thread emits two falling edges per
/// revolution at `max_rpm * duty / 255`.
pub struct SimulatedTach {
    duty: Arc<AtomicU8>,
    max_rpm: f64,
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Longest single sleep in the edge thread; bounds deregistration latency.
const SIM_POLL: Duration = Duration::from_millis(20);

impl SimulatedTach {
    pub fn new(duty: Arc<AtomicU8>, max_rpm: f64) -> Self {
        Self {
            duty,
            max_rpm,
            active: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn half_revolution(max_rpm: f64, duty: u8) -> Option<Duration> {
        let rpm = max_rpm * f64::from(duty) / 255.0;
        if !(rpm.is_finite() && rpm > 0.0) {
            return None;
        }
        // Two edges per revolution. Too slow to represent reads as stalled.
        Duration::try_from_secs_f64(60.0 / rpm / 2.0).ok()
    }

    fn stop_worker(&mut self) {
        self.active.store(false, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("simulated tach thread panicked");
            }
        }
    }
}

impl PulseInput for SimulatedTach {
    fn register_falling_edge(&mut self, mut handler: EdgeHandler) -> Result<(), BoxError> {
        self.stop_worker();
        self.active.store(true, Ordering::Relaxed);
        let active = self.active.clone();
        let duty = self.duty.clone();
        let max_rpm = self.max_rpm;
        let ticks = MonotonicTicks::new();

        self.worker = Some(std::thread::spawn(move || {
            while active.load(Ordering::Relaxed) {
                let Some(mut remaining) =
                    Self::half_revolution(max_rpm, duty.load(Ordering::Relaxed))
                else {
                    std::thread::sleep(SIM_POLL);
                    continue;
                };
                while !remaining.is_zero() {
                    let chunk = remaining.min(SIM_POLL);
                    std::thread::sleep(chunk);
                    remaining -= chunk;
                    if !active.load(Ordering::Relaxed) {
                        return;
                    }
                }
                handler(ticks.ticks());
            }
        }));
        Ok(())
    }

    fn deregister(&mut self) -> Result<(), BoxError> {
        self.stop_worker();
        Ok(())
    }
}

impl Drop for SimulatedTach {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn simulated_sensor_reports_latest_value() {
        let mut sensor = SimulatedSensor::new(72.5);
        let handle = sensor.clone();
        assert_eq!(sensor.read_fahrenheit().unwrap(), 72.5);
        handle.set(96.0);
        assert_eq!(sensor.read_fahrenheit().unwrap(), 96.0);
    }

    #[test]
    fn simulated_fan_tracks_duty_and_writes() {
        let mut fan = SimulatedFan::new();
        fan.set_duty_cycle(128).unwrap();
        fan.off().unwrap();
        assert_eq!(fan.duty(), 0);
        assert_eq!(fan.writes(), 2);
    }

    #[test]
    fn half_revolution_scales_with_duty() {
        assert_eq!(SimulatedTach::half_revolution(3000.0, 0), None);
        // 3000 rpm -> 20 ms per rev -> 10 ms per edge
        let d = SimulatedTach::half_revolution(3000.0, 255).unwrap();
        assert!((d.as_secs_f64() - 0.010).abs() < 1e-9);
        // A tiny but valid max_rpm is stalled, not a panic
        assert_eq!(SimulatedTach::half_revolution(1e-300, 1), None);
    }

    #[test]
    fn simulated_tach_emits_edges_while_spinning() {
        let mut fan = SimulatedFan::new();
        fan.set_duty_cycle(255).unwrap();
        let mut tach = fan.tachometer(6000.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        tach.register_falling_edge(Box::new(move |tick| {
            if let Ok(mut v) = sink.lock() {
                v.push(tick);
            }
        }))
        .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        tach.deregister().unwrap();
        let count = seen.lock().unwrap().len();
        assert!(count >= 2, "expected edges, got {count}");

        // No edges after deregistration.
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[test]
    fn stopped_fan_emits_no_edges() {
        let fan = SimulatedFan::new();
        let mut tach = fan.tachometer(3000.0);
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        tach.register_falling_edge(Box::new(move |_| {
            sink.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        std::thread::sleep(Duration::from_millis(60));
        drop(tach);
        assert_eq!(seen.load(Ordering::Relaxed), 0);
    }
}
