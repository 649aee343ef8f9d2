//! Command execution: config mapping, device assembly, and output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fanctl_config::Config;
use fanctl_core::error::Result as CoreResult;
use fanctl_core::{
    Controller, ControllerBuilder, ControlCfg, FanError, FanReport, RunLimits, Set, SpeedCurve,
    fan_speed_percent, map_hw_error,
};
use fanctl_traits::TemperatureSensor;
use serde_json::json;

use crate::cli::SIM_TEMP_ENV;

/// Simulated temperature: `FANCTL_SIM_TEMP_F` when set, else `[sim].temp_f`.
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub fn sim_temp_f(cfg: &Config) -> Result<f64, FanError> {
    let Ok(raw) = std::env::var(SIM_TEMP_ENV) else {
        return Ok(cfg.sim.temp_f);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| {
            FanError::Config(format!(
                "{SIM_TEMP_ENV} must be a finite number, got {raw:?}"
            ))
        })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn sensor_for(cfg: &Config) -> Result<Box<dyn TemperatureSensor + Send>, FanError> {
    Ok(Box::new(fanctl_hardware::VcgencmdSensor::new(
        cfg.sensor.command.clone(),
        cfg.sensor.args.clone(),
    )))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sensor_for(cfg: &Config) -> Result<Box<dyn TemperatureSensor + Send>, FanError> {
    Ok(Box::new(fanctl_hardware::SimulatedSensor::new(sim_temp_f(cfg)?)))
}

/// Assemble the devices for the configured backend.
#[cfg(all(feature = "hardware", target_os = "linux"))]
fn devices(cfg: &Config) -> Result<ControllerBuilder<Set, Set, Set>, FanError> {
    use fanctl_hardware::gpio::{GpioFan, GpioTach};

    let fan = GpioFan::new(cfg.pins.fan_pwm, cfg.pwm.frequency_hz).map_err(|e| {
        FanError::Init(format!("open fan pwm pin {}: {e}", cfg.pins.fan_pwm))
    })?;
    let tach = GpioTach::new(cfg.pins.tach)
        .map_err(|e| FanError::Init(format!("open tachometer pin {}: {e}", cfg.pins.tach)))?;
    tracing::info!(
        fan_pwm = cfg.pins.fan_pwm,
        tach = cfg.pins.tach,
        frequency_hz = cfg.pwm.frequency_hz,
        "using gpio backend"
    );
    Ok(Controller::builder()
        .with_sensor(sensor_for(cfg)?)
        .with_pwm(fan)
        .with_tachometer(tach))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn devices(cfg: &Config) -> Result<ControllerBuilder<Set, Set, Set>, FanError> {
    let fan = fanctl_hardware::SimulatedFan::new();
    let tach = fan.tachometer(cfg.sim.max_rpm);
    tracing::info!(max_rpm = cfg.sim.max_rpm, "using simulated backend");
    Ok(Controller::builder()
        .with_sensor(sensor_for(cfg)?)
        .with_pwm(fan)
        .with_tachometer(tach))
}

fn report_line(r: &FanReport, json: bool) -> String {
    if json {
        json!({
            "event": "report",
            "temp_f": r.temp_f,
            "sensor_ok": r.sensor_ok,
            "duty": r.duty,
            "fan_speed_pct": r.fan_speed_percent().round(),
            "rpm": r.rpm.round(),
        })
        .to_string()
    } else {
        format!(
            "temp={:.1}F duty={} speed={:.0}% rpm={:.0}",
            r.temp_f,
            r.duty,
            r.fan_speed_percent(),
            r.rpm
        )
    }
}

/// `fanctl run`: supervise the controller until Ctrl-C or the cycle limit.
pub fn run_fan(
    cfg: &Config,
    interval_ms: Option<u64>,
    cycles: Option<u64>,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<()> {
    let mut control = ControlCfg::try_from(cfg)?;
    if let Some(ms) = interval_ms {
        if ms == 0 {
            return Err(FanError::Config("--interval-ms must be >= 1".into()).into());
        }
        control.sample_interval = Duration::from_millis(ms);
    }

    let builder = devices(cfg)?.with_control(control);

    let mut last: Option<FanReport> = None;
    let snap = fanctl_core::run(
        builder,
        shutdown.clone(),
        RunLimits { max_cycles: cycles },
        |r| {
            println!("{}", report_line(r, json));
            last = Some(r.clone());
        },
    )?;

    let interrupted = shutdown.load(Ordering::Relaxed);
    if json {
        println!(
            "{}",
            json!({
                "event": "stopped",
                "cycles": snap.cycles,
                "rpm": snap.rpm.round(),
                "duty": snap.duty,
                "last_temp_f": last.as_ref().map(|r| r.temp_f),
                "last_duty": last.as_ref().map(|r| r.duty),
                "interrupted": interrupted,
            })
        );
    } else {
        println!(
            "stopped after {} cycles; last rpm={:.0}; fan off",
            snap.cycles, snap.rpm
        );
    }
    Ok(())
}

/// `fanctl curve`: evaluate the configured curve at one temperature.
pub fn show_curve(cfg: &Config, temp_f: f64, json: bool) -> CoreResult<()> {
    let curve = SpeedCurve::new(cfg.curve.bands.clone())?;
    let duty = curve.duty_cycle_for(temp_f);
    if json {
        println!(
            "{}",
            json!({
                "temp_f": temp_f,
                "duty": duty,
                "fan_speed_pct": fan_speed_percent(duty).round(),
            })
        );
    } else {
        println!(
            "temp={temp_f:.1}F duty={duty} speed={:.0}%",
            fan_speed_percent(duty)
        );
    }
    Ok(())
}

/// `fanctl self-check`: one sensor read through the configured backend.
pub fn self_check(cfg: &Config, json: bool) -> CoreResult<()> {
    let curve = SpeedCurve::new(cfg.curve.bands.clone())?;
    let mut sensor = sensor_for(cfg)?;
    let temp_f = sensor
        .read_fahrenheit()
        .map_err(|e| map_hw_error(&*e))?;
    let duty = curve.duty_cycle_for(temp_f);
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "temp_f": temp_f,
                "duty": duty,
                "fan_speed_pct": fan_speed_percent(duty).round(),
            })
        );
    } else {
        println!(
            "OK: temp={temp_f:.1}F target duty={duty} speed={:.0}%",
            fan_speed_percent(duty)
        );
    }
    Ok(())
}
