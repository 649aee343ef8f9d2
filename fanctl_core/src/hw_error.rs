//! Maps `Box<dyn Error>` from trait boundaries to typed `FanError`.
//!
//! The traits in `fanctl_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `fanctl_hardware::HwError` downcasting.

use crate::error::FanError;

/// Map a trait-boundary error to a typed `FanError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> FanError {
    #[cfg(feature = "hardware-errors")]
    {
        use fanctl_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Sensor(_) | HwError::Parse(_) => FanError::Sensor(hw.to_string()),
                HwError::Pwm(_) => FanError::Actuator(hw.to_string()),
                HwError::Gpio(_) => FanError::HardwareFault(hw.to_string()),
                HwError::Io(_) => FanError::Hardware(hw.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        FanError::Timeout
    } else {
        FanError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_string_heuristics() {
        let e = std::io::Error::other("read timeout on bus");
        assert_eq!(map_hw_error(&e), FanError::Timeout);
        let e = std::io::Error::other("bus fault");
        assert_eq!(map_hw_error(&e), FanError::Hardware("bus fault".into()));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hw_errors() {
        use fanctl_hardware::error::HwError;
        let e = HwError::Parse("temp=?".into());
        assert!(matches!(map_hw_error(&e), FanError::Sensor(_)));
        let e = HwError::Pwm("busy".into());
        assert!(matches!(map_hw_error(&e), FanError::Actuator(_)));
        let e = HwError::Gpio("no /dev/gpiomem".into());
        assert!(matches!(map_hw_error(&e), FanError::HardwareFault(_)));
    }
}
