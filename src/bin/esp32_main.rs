//! ESP32-C3 SuperMini drawing station.
//!
//! This is the main entry point for the physical station. It brings up the
//! OLED, the three button/servo pairs and the status LEDs, then hands
//! everything to the control loop, which:
//! - Blinks the LEDs and the on-screen indicator
//! - Scans the buttons and sweeps the matching servo
//! - Keeps the status screen up to date
//!
//! Any error escaping the loop ends `main`, and ESP-IDF reboots the board.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::{IOPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use tekenrobot::bus::RetryingBus;
use tekenrobot::config::Config;
use tekenrobot::control::ControlLoop;
use tekenrobot::display::Ssd1306;
use tekenrobot::hal::esp32::{pins, servo_timer, Esp32Clock, Esp32Servo};
use tekenrobot::servo::{ActuatorSet, ButtonActuatorPair};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .init();

    println!();
    println!("================================");
    println!("  VPC Tekenrobot");
    println!("================================");
    println!();

    let config = Config::default();
    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize Display (SSD1306 on GPIO8/9)
    // =========================================================================
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8, // SDA
        peripherals.pins.gpio9, // SCL
        &I2cConfig::new().baudrate(config.display.bus_frequency_hz.Hz()),
    )?;
    let bus = RetryingBus::new(i2c, Delay::new_default(), config.display.address)
        .with_policy(config.display.retry);
    let mut display = Ssd1306::from_config(bus, &config.display)?;
    display.initialize()?;
    println!(
        "[OK] Display initialized (GPIO{}/{} I2C @ {} Hz)",
        pins::I2C_SDA,
        pins::I2C_SCL,
        config.display.bus_frequency_hz
    );

    // =========================================================================
    // Initialize Servos (LEDC on GPIO2/3/4)
    // =========================================================================
    let timer = servo_timer(peripherals.ledc.timer0, &config.servo)?;
    let servos = [
        Esp32Servo::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio2)?,
        Esp32Servo::new(peripherals.ledc.channel1, &timer, peripherals.pins.gpio3)?,
        Esp32Servo::new(peripherals.ledc.channel2, &timer, peripherals.pins.gpio4)?,
    ];
    println!(
        "[OK] Servos initialized (GPIO{:?} @ {} Hz)",
        pins::SERVOS,
        config.servo.frequency_hz
    );

    // =========================================================================
    // Initialize Buttons (GPIO5/6/7, pull-down)
    // =========================================================================
    let mut buttons = [
        PinDriver::input(peripherals.pins.gpio5.downgrade())?,
        PinDriver::input(peripherals.pins.gpio6.downgrade())?,
        PinDriver::input(peripherals.pins.gpio7.downgrade())?,
    ];
    for button in buttons.iter_mut() {
        button.set_pull(Pull::Down)?;
    }
    println!("[OK] Buttons initialized (GPIO{:?})", pins::BUTTONS);

    let mut actuators = ActuatorSet::new();
    for ((id, button), servo) in pins::BUTTONS.into_iter().zip(buttons).zip(servos) {
        actuators = actuators.with_pair(ButtonActuatorPair::new(id, button, servo, config.servo.duty))?;
    }

    // =========================================================================
    // Initialize Status LEDs (GPIO10/20)
    // =========================================================================
    let leds = (
        PinDriver::output(peripherals.pins.gpio10)?,
        PinDriver::output(peripherals.pins.gpio20)?,
    );
    println!(
        "[OK] LEDs initialized (GPIO{}/{})",
        pins::LED_STATUS,
        pins::LED_EXTERNAL
    );

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    println!();
    println!("Starting control loop...");
    println!();

    let mut station = ControlLoop::new(display, actuators, leds, Esp32Clock::new(), Delay::new_default())
        .with_config(&config);

    let never = station.run()?;
    match never {}
}
