//! # tekenrobot
//!
//! Firmware library for a small drawing-robot control station: a 128x64
//! SSD1306 status screen on a slow I2C link, push buttons that each trigger
//! one full sweep of a hobby servo, and two blinking status LEDs.
//!
//! ## Features
//!
//! - **Resilient display link**: every I2C write is retried with a bounded budget
//! - **Chunked frame transfer**: small data transactions with paced gaps
//! - **Open-loop servos**: linear angle-to-duty map, blocking 0°→180°→0° sweeps
//! - **Single-threaded loop**: blink, scan, idle; nothing runs concurrently
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `bus` - Addressed I2C writes with retry
//! - `display` - SSD1306 frame buffer and transfer
//! - `render` - Status screen layout
//! - `servo` - Button/servo pairs and sweeps
//! - `control` - The loop that ties everything together
//! - `traits` - Hardware seams not covered by `embedded-hal`
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use tekenrobot::{
//!     bus::RetryingBus,
//!     config::Config,
//!     control::ControlLoop,
//!     display::Ssd1306,
//!     hal::{MockClock, MockDelay, MockI2c, MockInput, MockLed, MockPwm},
//!     servo::{ActuatorSet, ButtonActuatorPair},
//! };
//!
//! let config = Config::default();
//!
//! let bus = RetryingBus::new(MockI2c::new(), MockDelay::new(), config.display.address);
//! let mut display = Ssd1306::from_config(bus, &config.display).unwrap();
//! display.initialize().unwrap();
//!
//! let mut actuators = ActuatorSet::new();
//! for id in [13, 14, 15] {
//!     let pair = ButtonActuatorPair::new(id, MockInput::new(), MockPwm::new(), config.servo.duty);
//!     actuators = actuators.with_pair(pair).unwrap();
//! }
//!
//! let clock = MockClock::new();
//! let mut station = ControlLoop::new(
//!     display,
//!     actuators,
//!     (MockLed::new(), MockLed::new()),
//!     clock.clone(),
//!     MockDelay::with_clock(clock),
//! )
//! .with_config(&config);
//!
//! station.start().unwrap();
//! station.tick().unwrap();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Addressed I2C writes with bounded retry.
pub mod bus;
/// Boot-time configuration for display, servos, loop timing and texts.
pub mod config;
/// The blink/scan/idle control loop.
pub mod control;
/// SSD1306 driver with an in-memory frame buffer.
pub mod display;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Status screen layout.
pub mod render;
/// Button-triggered servo actuators.
pub mod servo;
/// Hardware seams beyond `embedded-hal`.
pub mod traits;

// Re-exports for convenience
pub use bus::{BusError, RetryPolicy, RetryingBus};
pub use config::{Config, DisplayConfig, LoopConfig, ServoConfig, TextConfig};
pub use control::{ControlLoop, LoopError, LoopState};
pub use display::{DisplayError, FrameBuffer, Pacing, Ssd1306};
pub use render::{render, Screen};
pub use servo::{
    angle_to_duty, sweep_angles, ActuatorSet, ButtonActuatorPair, DutyRange, Servo, ServoAngle,
    ServoError, SweepProfile,
};
pub use traits::{Clock, StatusDisplay, StatusLeds};
