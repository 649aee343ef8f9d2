//! Type-state builder for `Controller`.
//!
//! The builder enforces at compile time that the sensor, PWM output and
//! tachometer input are provided before `start()` is available.
//! `try_start()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::time::Duration;

use fanctl_traits::{Clock, FanPwm, MonotonicClock, PulseInput, TemperatureSensor};

use crate::config::ControlCfg;
use crate::controller::Controller;
use crate::curve::SpeedCurve;
use crate::error::{BuildError, Result};

type BoxedSensor = Box<dyn TemperatureSensor + Send>;
type BoxedPwm = Box<dyn FanPwm + Send>;
type BoxedInput = Box<dyn PulseInput + Send>;
type BoxedClock = Box<dyn Clock + Send>;

impl Controller {
    /// Start building a Controller.
    pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
        ControllerBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Controller`. Settings are validated on `start()`.
pub struct ControllerBuilder<S, P, I> {
    sensor: Option<BoxedSensor>,
    pwm: Option<BoxedPwm>,
    input: Option<BoxedInput>,
    clock: Option<BoxedClock>,
    control: Option<ControlCfg>,
    sample_interval: Option<Duration>,
    curve: Option<SpeedCurve>,
    _s: PhantomData<S>,
    _p: PhantomData<P>,
    _i: PhantomData<I>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            pwm: None,
            input: None,
            clock: None,
            control: None,
            sample_interval: None,
            curve: None,
            _s: PhantomData,
            _p: PhantomData,
            _i: PhantomData,
        }
    }
}

impl<S, P, I> ControllerBuilder<S, P, I> {
    /// Move every field into a builder with different markers.
    fn retag<S2, P2, I2>(self) -> ControllerBuilder<S2, P2, I2> {
        ControllerBuilder {
            sensor: self.sensor,
            pwm: self.pwm,
            input: self.input,
            clock: self.clock,
            control: self.control,
            sample_interval: self.sample_interval,
            curve: self.curve,
            _s: PhantomData,
            _p: PhantomData,
            _i: PhantomData,
        }
    }

    /// Fallible start available in any type-state; returns a `BuildError`
    /// for missing pieces and `FanError::Init` when hardware setup fails.
    pub fn try_start(self) -> Result<Controller> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let pwm = self
            .pwm
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPwm))?;
        let input = self
            .input
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTachometer))?;

        let mut cfg = self.control.unwrap_or_default();
        if let Some(interval) = self.sample_interval {
            cfg.sample_interval = interval;
        }
        if let Some(curve) = self.curve {
            cfg.curve = curve;
        }
        if cfg.sample_interval.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sample_interval must be > 0",
            )));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));
        Controller::start(sensor, pwm, input, clock, cfg).map_err(eyre::Report::new)
    }
}

/// Chainable setters that do not affect type-state.
impl<S, P, I> ControllerBuilder<S, P, I> {
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    /// Override the sample interval from `with_control`.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = Some(interval);
        self
    }

    /// Override the curve from `with_control`.
    pub fn with_curve(mut self, curve: SpeedCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }
}

// Setters that advance type-state
impl<P, I> ControllerBuilder<Missing, P, I> {
    pub fn with_sensor(
        mut self,
        sensor: impl TemperatureSensor + Send + 'static,
    ) -> ControllerBuilder<Set, P, I> {
        self.sensor = Some(Box::new(sensor));
        self.retag()
    }
}

impl<S, I> ControllerBuilder<S, Missing, I> {
    pub fn with_pwm(mut self, pwm: impl FanPwm + Send + 'static) -> ControllerBuilder<S, Set, I> {
        self.pwm = Some(Box::new(pwm));
        self.retag()
    }
}

impl<S, P> ControllerBuilder<S, P, Missing> {
    pub fn with_tachometer(
        mut self,
        input: impl PulseInput + Send + 'static,
    ) -> ControllerBuilder<S, P, Set> {
        self.input = Some(Box::new(input));
        self.retag()
    }
}

impl ControllerBuilder<Set, Set, Set> {
    /// Validate and start. Only available when sensor, PWM and tachometer are set.
    pub fn start(self) -> Result<Controller> {
        self.try_start()
    }
}
