#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core fan control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `fanctl_traits` seams:
//! `TemperatureSensor`, `FanPwm` and `PulseInput`.
//!
//! ## Architecture
//!
//! - **Tachometer**: lock-free pulse→RPM estimation fed from the edge
//!   dispatch context (`tach` module)
//! - **Curve**: banded temperature→duty step function (`curve` module)
//! - **Control**: the Idle→Running→Stopping→Stopped loop (`control` module)
//! - **Controller**: control thread plus tachometer registration
//!   (`controller`, built through `builder`)
//! - **Runner**: supervised run with shutdown flag and cycle limit
//!
//! Duties are on a 0..=255 scale throughout; temperatures are in °F.

pub mod builder;
pub mod config;
pub mod control;
pub mod controller;
pub mod conversions;
pub mod curve;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod status;
pub mod tach;
pub mod util;

pub use builder::{ControllerBuilder, Missing, Set};
pub use config::ControlCfg;
pub use control::{ControlLoop, SENSOR_FAILURE_TEMP_F};
pub use controller::Controller;
pub use curve::{DEFAULT_BANDS, SpeedCurve, duty_cycle_for};
pub use error::{BuildError, FanError, Report, Result};
pub use hw_error::map_hw_error;
pub use runner::{RunLimits, run};
pub use status::{ControlState, FanReport, FanSnapshot};
pub use tach::{PULSES_PER_REVOLUTION, TachometerEstimator};
pub use util::fan_speed_percent;
