//! Periodic temperature → duty control loop.
//!
//! The loop is the only writer of the current duty and the only caller of
//! the actuator. Per-iteration failures are logged and absorbed; only
//! `begin` surfaces an error that prevents the loop from running.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fanctl_traits::{Clock, FanPwm, TemperatureSensor};
use tracing::{debug, error, info, warn};

use crate::curve::SpeedCurve;
use crate::error::FanError;
use crate::hw_error::map_hw_error;
use crate::status::{ControlState, FanReport};
use crate::tach::TachometerEstimator;
use crate::util::fan_speed_percent;

/// Temperature substituted when the sensor read fails.
pub const SENSOR_FAILURE_TEMP_F: f64 = 0.0;

pub struct ControlLoop<T, P> {
    sensor: T,
    pwm: P,
    curve: SpeedCurve,
    duty: u8,
    state: ControlState,
}

impl<T: TemperatureSensor, P: FanPwm> ControlLoop<T, P> {
    pub fn new(sensor: T, pwm: P, curve: SpeedCurve) -> Self {
        Self {
            sensor,
            pwm,
            curve,
            duty: 0,
            state: ControlState::Idle,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Duty last written to the actuator.
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Idle → Running: drive the actuator to 0.
    pub fn begin(&mut self) -> Result<(), FanError> {
        if self.state != ControlState::Idle {
            return Err(FanError::State(format!(
                "begin() called in {:?}",
                self.state
            )));
        }
        self.pwm
            .off()
            .map_err(|e| FanError::Init(map_hw_error(&*e).to_string()))?;
        self.duty = 0;
        self.state = ControlState::Running;
        info!("control loop running");
        Ok(())
    }

    fn sample_temperature(&mut self) -> (f64, bool) {
        match self.sensor.read_fahrenheit() {
            Ok(t) => (t, true),
            Err(e) => {
                let err = map_hw_error(&*e);
                error!(error = %err, "temperature read failed; using 0.0F sentinel");
                (SENSOR_FAILURE_TEMP_F, false)
            }
        }
    }

    /// One iteration: sample, decide, apply if changed, read back RPM.
    ///
    /// An actuator failure leaves the recorded duty untouched so the write
    /// is retried on the next iteration.
    pub fn step(&mut self, tach: &TachometerEstimator) -> Result<FanReport, FanError> {
        if self.state != ControlState::Running {
            return Err(FanError::State(format!("step() called in {:?}", self.state)));
        }

        let (temp_f, sensor_ok) = self.sample_temperature();
        debug!(temp_f, "cpu temperature");

        let target = self.curve.duty_cycle_for(temp_f);
        let changed = target != self.duty;
        if changed {
            self.pwm
                .set_duty_cycle(target)
                .map_err(|e| FanError::Actuator(map_hw_error(&*e).to_string()))?;
            info!(from = self.duty, to = target, "fan duty changed");
            self.duty = target;
        }

        Ok(FanReport {
            temp_f,
            sensor_ok,
            duty: self.duty,
            changed,
            rpm: tach.read_rpm(),
        })
    }

    /// Running → Stopping. No effect in other states.
    pub fn request_stop(&mut self) {
        if self.state == ControlState::Running {
            self.state = ControlState::Stopping;
        }
    }

    /// → Stopped, forcing the actuator off regardless of the recorded duty.
    pub fn finish(&mut self) -> Result<(), FanError> {
        let res = self.pwm.off();
        self.duty = 0;
        self.state = ControlState::Stopped;
        match res {
            Ok(()) => {
                info!("control loop stopped; fan off");
                Ok(())
            }
            Err(e) => {
                let err = FanError::Actuator(map_hw_error(&*e).to_string());
                error!(error = %err, "failed to switch fan off");
                Err(err)
            }
        }
    }

    /// Iterate every `interval` until `running` clears, then finish.
    ///
    /// The flag is checked at the top of each iteration only; an in-progress
    /// sleep is not interrupted. `observe` sees every iteration's outcome.
    /// A panic inside the sensor or actuator fails that iteration only.
    pub fn run<C: Clock>(
        &mut self,
        tach: &TachometerEstimator,
        clock: &C,
        interval: Duration,
        running: &AtomicBool,
        mut observe: impl FnMut(&Result<FanReport, FanError>),
    ) -> Result<(), FanError> {
        if self.state != ControlState::Running {
            return Err(FanError::State(format!("run() called in {:?}", self.state)));
        }
        loop {
            if !running.load(Ordering::Acquire) {
                self.request_stop();
                break;
            }

            let outcome =
                catch_unwind(AssertUnwindSafe(|| self.step(tach))).unwrap_or_else(|_| {
                    error!("control iteration panicked");
                    Err(FanError::HardwareFault("control iteration panicked".into()))
                });
            match &outcome {
                Ok(r) => info!(
                    temp_f = r.temp_f,
                    fan_speed_pct = fan_speed_percent(r.duty).round(),
                    rpm = r.rpm.round(),
                    "fan status"
                ),
                Err(e) => warn!(error = %e, "control iteration failed; no change this cycle"),
            }
            observe(&outcome);

            clock.sleep(interval);
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{NoopSensor, RecordingFan, ScriptedSensor};

    #[test]
    fn begin_drives_actuator_off() {
        let fan = RecordingFan::new();
        let mut ctl = ControlLoop::new(NoopSensor, fan.clone(), SpeedCurve::default());
        assert_eq!(ctl.state(), ControlState::Idle);
        ctl.begin().unwrap();
        assert_eq!(ctl.state(), ControlState::Running);
        assert_eq!(fan.writes(), vec![0]);
        assert!(matches!(ctl.begin(), Err(FanError::State(_))));
    }

    #[test]
    fn begin_failure_is_init_error() {
        let fan = RecordingFan::failing();
        let mut ctl = ControlLoop::new(NoopSensor, fan, SpeedCurve::default());
        assert!(matches!(ctl.begin(), Err(FanError::Init(_))));
        assert_eq!(ctl.state(), ControlState::Idle);
    }

    #[test]
    fn step_requires_running() {
        let tach = TachometerEstimator::new();
        let mut ctl = ControlLoop::new(NoopSensor, RecordingFan::new(), SpeedCurve::default());
        assert!(matches!(ctl.step(&tach), Err(FanError::State(_))));
    }

    #[test]
    fn sensor_failure_substitutes_sentinel_and_turns_fan_off() {
        let tach = TachometerEstimator::new();
        let fan = RecordingFan::new();
        let sensor = ScriptedSensor::new([Some(96.0), None]);
        let mut ctl = ControlLoop::new(sensor, fan.clone(), SpeedCurve::default());
        ctl.begin().unwrap();

        let r = ctl.step(&tach).unwrap();
        assert_eq!(r.duty, 255);
        let r = ctl.step(&tach).unwrap();
        assert!(!r.sensor_ok);
        assert_eq!(r.temp_f, SENSOR_FAILURE_TEMP_F);
        assert_eq!(r.duty, 0);
        assert!(r.changed);
        assert_eq!(fan.writes(), vec![0, 255, 0]);
    }

    #[test]
    fn actuator_failure_is_retried_next_cycle() {
        let tach = TachometerEstimator::new();
        let fan = RecordingFan::new();
        let sensor = ScriptedSensor::new([Some(90.0), Some(90.0)]);
        let mut ctl = ControlLoop::new(sensor, fan.clone(), SpeedCurve::default());
        ctl.begin().unwrap();

        fan.fail_next(1);
        assert!(matches!(ctl.step(&tach), Err(FanError::Actuator(_))));
        assert_eq!(ctl.duty(), 0);

        let r = ctl.step(&tach).unwrap();
        assert!(r.changed);
        assert_eq!(r.duty, 192);
        assert_eq!(fan.writes(), vec![0, 192]);
    }

    #[test]
    fn report_carries_latest_rpm() {
        let tach = TachometerEstimator::new();
        for t in [0, 10_000, 20_000] {
            tach.on_pulse(t);
        }
        let mut ctl = ControlLoop::new(
            ScriptedSensor::new([Some(70.0)]),
            RecordingFan::new(),
            SpeedCurve::default(),
        );
        ctl.begin().unwrap();
        let r = ctl.step(&tach).unwrap();
        assert_eq!(r.rpm, 3_000.0);
        assert_eq!(r.fan_speed_percent(), 0.0);
    }
}
