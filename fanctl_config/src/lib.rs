#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the fan controller.
//!
//! Every section is optional; an empty file yields the stock Raspberry Pi
//! wiring (PWM on GPIO 18, tachometer on GPIO 23), a 10 s sample interval
//! and the default temperature curve. Call `Config::validate` after loading.
use serde::Deserialize;
use serde::de::Deserializer;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    /// BCM pin driving the fan PWM input
    pub fan_pwm: u8,
    /// BCM pin wired to the fan tachometer output (open collector)
    pub tach: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            fan_pwm: 18,
            tach: 23,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ControlCfg {
    /// Time between control-loop iterations (ms)
    pub sample_interval_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            sample_interval_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PwmCfg {
    /// Software PWM carrier frequency
    pub frequency_hz: f64,
}

impl Default for PwmCfg {
    fn default() -> Self {
        Self { frequency_hz: 800.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CurveCfg {
    /// Temperature bands, ascending. Accepts either:
    /// - array of tuples: [[80.0, 64], [85.0, 128], ...]
    /// - array of tables: [{ threshold_f = 80.0, duty = 64 }, ...]
    /// Below the first threshold the duty is 0.
    #[serde(deserialize_with = "de_curve_bands")]
    pub bands: Vec<(f64, u8)>,
}

impl Default for CurveCfg {
    fn default() -> Self {
        Self {
            bands: vec![(80.0, 64), (85.0, 128), (90.0, 192), (95.0, 255)],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorCfg {
    /// Program printing `temp=NN.N'C`
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            command: "vcgencmd".to_string(),
            args: vec!["measure_temp".to_string()],
        }
    }
}

/// Parameters of the simulated backend used when built without `hardware`.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimCfg {
    /// Tachometer speed at full duty
    pub max_rpm: f64,
    /// Reported CPU temperature
    pub temp_f: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            max_rpm: 3000.0,
            temp_f: 75.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub pwm: PwmCfg,
    #[serde(default)]
    pub curve: CurveCfg,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub sim: SimCfg,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BandToml {
    Tuple((f64, u8)),
    Table { threshold_f: f64, duty: u8 },
}

fn de_curve_bands<'de, D>(deserializer: D) -> Result<Vec<(f64, u8)>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<BandToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for b in items {
            match b {
                BandToml::Tuple((thr, duty)) => out.push((thr, duty)),
                BandToml::Table { threshold_f, duty } => out.push((threshold_f, duty)),
            }
        }
    }
    Ok(out)
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.fan_pwm == self.pins.tach {
            eyre::bail!("pins.fan_pwm and pins.tach must differ");
        }

        // Control
        if self.control.sample_interval_ms == 0 {
            eyre::bail!("control.sample_interval_ms must be >= 1");
        }
        if self.control.sample_interval_ms > 60 * 60 * 1000 {
            eyre::bail!("control.sample_interval_ms is unreasonably large (>1h)");
        }

        // PWM
        if !(self.pwm.frequency_hz.is_finite() && self.pwm.frequency_hz > 0.0) {
            eyre::bail!("pwm.frequency_hz must be > 0");
        }

        // Curve
        validate_bands(&self.curve.bands)?;

        // Sensor
        if self.sensor.command.trim().is_empty() {
            eyre::bail!("sensor.command must not be empty");
        }

        // Sim
        if !(self.sim.max_rpm.is_finite() && self.sim.max_rpm > 0.0) {
            eyre::bail!("sim.max_rpm must be > 0");
        }
        if !self.sim.temp_f.is_finite() {
            eyre::bail!("sim.temp_f must be finite");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// Curve bands must have finite, strictly ascending thresholds and
/// non-decreasing duties so the resulting step function is monotonic.
pub fn validate_bands(bands: &[(f64, u8)]) -> eyre::Result<()> {
    if bands.is_empty() {
        eyre::bail!("curve.bands must contain at least one band");
    }
    for (i, (thr, _)) in bands.iter().enumerate() {
        if !thr.is_finite() {
            eyre::bail!("curve.bands[{i}] threshold must be finite");
        }
    }
    for (i, pair) in bands.windows(2).enumerate() {
        let (t0, d0) = pair[0];
        let (t1, d1) = pair[1];
        if t1 <= t0 {
            eyre::bail!(
                "curve.bands thresholds must be strictly ascending (index {} and {})",
                i,
                i + 1
            );
        }
        if d1 < d0 {
            eyre::bail!(
                "curve.bands duties must be non-decreasing (index {} and {})",
                i,
                i + 1
            );
        }
    }
    Ok(())
}
