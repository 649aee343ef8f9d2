use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FanError {
    /// Controller could not start; nothing is running.
    #[error("initialization failed: {0}")]
    Init(String),
    #[error("temperature sensor error: {0}")]
    Sensor(String),
    #[error("fan actuator error: {0}")]
    Actuator(String),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing temperature sensor")]
    MissingSensor,
    #[error("missing fan pwm output")]
    MissingPwm,
    #[error("missing tachometer input")]
    MissingTachometer,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
