//! Runtime configuration for the control loop.
//!
//! Separate from the TOML-deserialized config in `fanctl_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

use crate::curve::SpeedCurve;

#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Sleep between control iterations.
    pub sample_interval: Duration,
    /// Temperature → duty mapping.
    pub curve: SpeedCurve,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(10),
            curve: SpeedCurve::default(),
        }
    }
}
