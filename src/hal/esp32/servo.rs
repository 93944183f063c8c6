//! Hobby servo output on the ESP32 LEDC peripheral.
//!
//! All servos share one LEDC timer running at the servo frame rate; each
//! servo gets its own channel. The duty resolution is 14 bits, the widest
//! LEDC supports at 50 Hz on every ESP32 variant, so a 16-bit duty from
//! [`crate::servo`] lands within one LSB of the requested pulse width.

use embedded_hal::pwm::{self, ErrorType, SetDutyCycle};
use esp_idf_hal::ledc::{config::TimerConfig, LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

use crate::config::ServoConfig;

/// LEDC duty resolution used for servos.
pub const SERVO_RESOLUTION: Resolution = Resolution::Bits14;

/// Configures a LEDC timer for servo PWM.
///
/// Keep the returned driver alive for as long as any [`Esp32Servo`] built
/// from it is in use.
pub fn servo_timer<'d, T, TI>(timer: T, config: &ServoConfig) -> Result<LedcTimerDriver<'d, TI::SpeedMode>, EspError>
where
    TI: LedcTimer + 'd,
    T: Peripheral<P = TI> + 'd,
{
    let timer_config = TimerConfig::default()
        .frequency(config.frequency_hz.Hz())
        .resolution(SERVO_RESOLUTION);
    LedcTimerDriver::new(timer, &timer_config)
}

/// One servo on a LEDC channel.
///
/// # Example
///
/// ```ignore
/// use tekenrobot::config::ServoConfig;
/// use tekenrobot::hal::esp32::{servo_timer, Esp32Servo};
///
/// let peripherals = Peripherals::take()?;
/// let timer = servo_timer(peripherals.ledc.timer0, &ServoConfig::default())?;
/// let servo = Esp32Servo::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio2)?;
/// ```
pub struct Esp32Servo<'d> {
    pwm: LedcDriver<'d>,
    max_duty: u16,
}

impl<'d> Esp32Servo<'d> {
    /// Binds `channel` to `timer` and drives `pin`. The output starts at 0% duty.
    pub fn new<S, C, CI, P, PI>(channel: C, timer: &LedcTimerDriver<'d, S>, pin: P) -> Result<Self, EspError>
    where
        CI: LedcChannel<SpeedMode = S> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let mut pwm = LedcDriver::new(channel, timer, pin)?;
        pwm.set_duty(0)?;
        let max_duty = u16::try_from(pwm.get_max_duty()).unwrap_or(u16::MAX);
        Ok(Self { pwm, max_duty })
    }

    /// Raw LEDC duty currently set.
    pub fn raw_duty(&self) -> u32 {
        self.pwm.get_duty()
    }
}

impl ErrorType for Esp32Servo<'_> {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for Esp32Servo<'_> {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.pwm.set_duty(u32::from(duty)).map_err(|e| {
            tracing::warn!(duty, error = %e, "ledc set_duty failed");
            pwm::ErrorKind::Other
        })
    }
}
