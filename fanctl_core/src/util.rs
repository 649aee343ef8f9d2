//! Unit helpers shared by the estimator and the reporting path.

/// Number of microseconds in one minute.
pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Convert a 0..=255 duty to a 0..=100 fan-speed percentage.
#[inline]
pub fn fan_speed_percent(duty: u8) -> f64 {
    f64::from(duty) / 2.55
}
