//! Temperature → duty step function.

use crate::error::FanError;

/// Stock curve: `(threshold °F, duty)` bands above a duty-0 baseline.
pub const DEFAULT_BANDS: [(f64, u8); 4] = [(80.0, 64), (85.0, 128), (90.0, 192), (95.0, 255)];

/// Duty for `temp_f` on the stock curve.
///
/// | °F        | duty |
/// |-----------|------|
/// | < 80      | 0    |
/// | [80, 85)  | 64   |
/// | [85, 90)  | 128  |
/// | [90, 95)  | 192  |
/// | >= 95     | 255  |
#[inline]
pub fn duty_cycle_for(temp_f: f64) -> u8 {
    step(&DEFAULT_BANDS, temp_f)
}

/// Highest band whose threshold is <= `temp_f`; 0 below all bands and for NaN.
#[inline]
fn step(bands: &[(f64, u8)], temp_f: f64) -> u8 {
    bands
        .iter()
        .rev()
        .find(|(thr, _)| temp_f >= *thr)
        .map_or(0, |&(_, duty)| duty)
}

/// Monotonic step curve with validated bands.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedCurve {
    bands: Vec<(f64, u8)>,
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.to_vec(),
        }
    }
}

impl SpeedCurve {
    /// Build a curve from ascending `(threshold °F, duty)` bands.
    pub fn new(bands: Vec<(f64, u8)>) -> Result<Self, FanError> {
        fanctl_config::validate_bands(&bands).map_err(|e| FanError::Config(e.to_string()))?;
        Ok(Self { bands })
    }

    pub fn duty_cycle_for(&self, temp_f: f64) -> u8 {
        step(&self.bands, temp_f)
    }
}
