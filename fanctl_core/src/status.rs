//! Controller lifecycle and per-cycle reporting types.

use crate::util::fan_speed_percent;

/// Lifecycle of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Constructed; actuator not yet initialised.
    Idle,
    /// Sampling on the fixed interval.
    Running,
    /// Stop requested; the loop exits at its next iteration boundary.
    Stopping,
    /// Actuator forced off; loop exited.
    Stopped,
}

/// Outcome of one control iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct FanReport {
    /// Temperature used for the decision (0.0 when the read failed).
    pub temp_f: f64,
    /// False when the sensor failed and the 0.0 °F sentinel was used.
    pub sensor_ok: bool,
    /// Duty in effect after this iteration.
    pub duty: u8,
    /// Whether this iteration wrote a new duty to the actuator.
    pub changed: bool,
    /// Latest tachometer estimate at the time of the iteration.
    pub rpm: f64,
}

impl FanReport {
    pub fn fan_speed_percent(&self) -> f64 {
        fan_speed_percent(self.duty)
    }
}

/// Point-in-time view of a running controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanSnapshot {
    pub duty: u8,
    pub rpm: f64,
    pub cycles: u64,
}

impl FanSnapshot {
    pub fn fan_speed_percent(&self) -> f64 {
        fan_speed_percent(self.duty)
    }
}
