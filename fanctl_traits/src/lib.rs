//! Hardware seams shared by the fan controller crates.
//!
//! Errors crossing these boundaries are boxed so that simulated and real
//! backends can report their own error types; `fanctl_core` maps them to
//! its typed error enum.
pub mod clock;
pub mod tick;

pub use clock::{Clock, MonotonicClock, TestClock};
pub use tick::{MonotonicTicks, TestTicks, TickSource, tick_diff};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handler invoked with the edge timestamp (wrapping µs ticks) on every
/// falling edge. Runs in the edge dispatch context: keep it short.
pub type EdgeHandler = Box<dyn FnMut(u32) + Send + 'static>;

/// CPU temperature source, in degrees Fahrenheit.
pub trait TemperatureSensor {
    fn read_fahrenheit(&mut self) -> Result<f64, BoxError>;
}

/// PWM output driving the fan (duty on a 0..=255 scale).
pub trait FanPwm {
    fn set_duty_cycle(&mut self, level: u8) -> Result<(), BoxError>;

    /// Drive the fan to duty 0.
    fn off(&mut self) -> Result<(), BoxError> {
        self.set_duty_cycle(0)
    }
}

/// Tachometer input able to dispatch falling edges to a handler.
pub trait PulseInput {
    /// Configure the input and register `handler` for falling edges,
    /// replacing any previous registration.
    fn register_falling_edge(&mut self, handler: EdgeHandler) -> Result<(), BoxError>;

    /// Remove the handler; no further invocations happen once this returns.
    fn deregister(&mut self) -> Result<(), BoxError>;
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for Box<T> {
    fn read_fahrenheit(&mut self) -> Result<f64, BoxError> {
        (**self).read_fahrenheit()
    }
}

impl<P: FanPwm + ?Sized> FanPwm for Box<P> {
    fn set_duty_cycle(&mut self, level: u8) -> Result<(), BoxError> {
        (**self).set_duty_cycle(level)
    }

    fn off(&mut self) -> Result<(), BoxError> {
        (**self).off()
    }
}

impl<I: PulseInput + ?Sized> PulseInput for Box<I> {
    fn register_falling_edge(&mut self, handler: EdgeHandler) -> Result<(), BoxError> {
        (**self).register_falling_edge(handler)
    }

    fn deregister(&mut self) -> Result<(), BoxError> {
        (**self).deregister()
    }
}
