//! CPU temperature via the Raspberry Pi firmware tool (`vcgencmd measure_temp`).

use std::process::Command;

use fanctl_traits::{BoxError, TemperatureSensor};
use tracing::trace;

use crate::error::{HwError, Result};

/// Parse a `vcgencmd measure_temp` line such as `temp=48.3'C` into °C.
pub fn parse_measure_temp(line: &str) -> Result<f64> {
    let trimmed = line.trim();
    let value = trimmed
        .strip_prefix("temp=")
        .ok_or_else(|| HwError::Parse(trimmed.to_string()))?
        .trim_end_matches(['C', '\'']);
    let celsius: f64 = value
        .parse()
        .map_err(|_| HwError::Parse(trimmed.to_string()))?;
    if !celsius.is_finite() {
        return Err(HwError::Parse(trimmed.to_string()));
    }
    Ok(celsius)
}

#[inline]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Shell-command temperature source; the command must print a
/// `temp=NN.N'C` line on stdout.
#[derive(Debug, Clone)]
pub struct VcgencmdSensor {
    program: String,
    args: Vec<String>,
}

impl Default for VcgencmdSensor {
    fn default() -> Self {
        Self::new("vcgencmd", ["measure_temp"])
    }
}

impl VcgencmdSensor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn read_celsius(&self) -> Result<f64> {
        let out = Command::new(&self.program).args(&self.args).output()?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(HwError::Sensor(format!(
                "{} exited with {}: {}",
                self.program,
                out.status,
                stderr.trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        let line = stdout.lines().next().unwrap_or_default();
        let c = parse_measure_temp(line)?;
        trace!(celsius = c, "cpu temperature");
        Ok(c)
    }
}

impl TemperatureSensor for VcgencmdSensor {
    fn read_fahrenheit(&mut self) -> std::result::Result<f64, BoxError> {
        Ok(celsius_to_fahrenheit(self.read_celsius()?))
    }
}
