//! Conversions bridging `fanctl_config` types to `fanctl_core` types.

use std::time::Duration;

use crate::config::ControlCfg;
use crate::curve::SpeedCurve;
use crate::error::FanError;

impl TryFrom<&fanctl_config::Config> for ControlCfg {
    type Error = FanError;

    fn try_from(c: &fanctl_config::Config) -> Result<Self, Self::Error> {
        if c.control.sample_interval_ms == 0 {
            return Err(FanError::Config(
                "control.sample_interval_ms must be >= 1".into(),
            ));
        }
        Ok(Self {
            sample_interval: Duration::from_millis(c.control.sample_interval_ms),
            curve: SpeedCurve::new(c.curve.bands.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_runtime() {
        let cfg = fanctl_config::Config::default();
        let rt = ControlCfg::try_from(&cfg).unwrap();
        assert_eq!(rt.sample_interval, Duration::from_secs(10));
        assert_eq!(rt.curve, SpeedCurve::default());
    }

    #[test]
    fn bad_curve_is_config_error() {
        let mut cfg = fanctl_config::Config::default();
        cfg.curve.bands = vec![(90.0, 255), (80.0, 64)];
        assert!(matches!(
            ControlCfg::try_from(&cfg),
            Err(FanError::Config(_))
        ));
    }
}
