//! Raspberry Pi GPIO backend (rppal): tachometer input and software PWM fan.

use fanctl_traits::{BoxError, EdgeHandler, FanPwm, MonotonicTicks, PulseInput, TickSource};
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use tracing::debug;

use crate::error::{HwError, Result};

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Tachometer input: pull-up enabled, falling-edge interrupt, edges stamped
/// with a free-running microsecond tick.
pub struct GpioTach {
    pin: InputPin,
    ticks: MonotonicTicks,
}

impl GpioTach {
    pub fn new(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let pin = gpio.get(bcm_pin).map_err(gpio_err)?.into_input_pullup();
        debug!(pin = bcm_pin, "tach input configured (pull-up)");
        Ok(Self {
            pin,
            ticks: MonotonicTicks::new(),
        })
    }
}

impl PulseInput for GpioTach {
    fn register_falling_edge(&mut self, mut handler: EdgeHandler) -> std::result::Result<(), BoxError> {
        let ticks = self.ticks;
        self.pin
            .set_async_interrupt(Trigger::FallingEdge, move |_level| handler(ticks.ticks()))
            .map_err(gpio_err)?;
        Ok(())
    }

    fn deregister(&mut self) -> std::result::Result<(), BoxError> {
        self.pin.clear_async_interrupt().map_err(gpio_err)?;
        Ok(())
    }
}

/// Fan PWM output using rppal's software PWM on an arbitrary GPIO.
pub struct GpioFan {
    pin: OutputPin,
    frequency_hz: f64,
}

impl GpioFan {
    pub fn new(bcm_pin: u8, frequency_hz: f64) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let pin = gpio.get(bcm_pin).map_err(gpio_err)?.into_output_low();
        debug!(pin = bcm_pin, frequency_hz, "fan pwm output configured");
        Ok(Self { pin, frequency_hz })
    }
}

impl FanPwm for GpioFan {
    fn set_duty_cycle(&mut self, level: u8) -> std::result::Result<(), BoxError> {
        if level == 0 {
            return self.off();
        }
        let duty = f64::from(level) / 255.0;
        self.pin
            .set_pwm_frequency(self.frequency_hz, duty)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }

    fn off(&mut self) -> std::result::Result<(), BoxError> {
        self.pin
            .clear_pwm()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.pin.set_low();
        Ok(())
    }
}
