//! ESP32-C3 SuperMini hardware layer for the drawing station.
//!
//! Buttons, LEDs and the I2C bus use `esp-idf-hal` drivers directly, since
//! they already implement the `embedded-hal` 1.0 traits. This module adds
//! what is missing: the blink clock and a servo output with a fixed frame
//! rate.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini
//! - **Display**: SSD1306 128x64 OLED (I2C, 20 kHz)
//! - **Servos**: three SG90-class hobby servos (50 Hz)
//! - **Buttons**: three push buttons to 3V3, internal pull-downs
//! - **LEDs**: two status LEDs
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod clock;
mod servo;

pub use clock::Esp32Clock;
pub use servo::{servo_timer, Esp32Servo, SERVO_RESOLUTION};

/// Pin assignments for SuperMini ESP32-C3.
///
/// Each button's GPIO number doubles as its actuator id, so the screen
/// shows the pin that was pressed.
pub mod pins {
    // =========================================================================
    // I2C Display (SSD1306)
    // =========================================================================

    /// I2C data line (also has onboard blue LED - will flicker during I2C)
    pub const I2C_SDA: i32 = 8;

    /// I2C clock line (also shared with BOOT button - only affects programming)
    pub const I2C_SCL: i32 = 9;

    // =========================================================================
    // Buttons (active high, pull-down)
    // =========================================================================

    /// Buttons in scan order
    pub const BUTTONS: [u8; 3] = [5, 6, 7];

    // =========================================================================
    // Servos (LEDC, one shared timer)
    // =========================================================================

    /// Servo outputs, paired by position with [`BUTTONS`]
    pub const SERVOS: [u8; 3] = [2, 3, 4];

    // =========================================================================
    // Status LEDs
    // =========================================================================

    /// First status LED
    pub const LED_STATUS: i32 = 10;

    /// Second status LED
    pub const LED_EXTERNAL: i32 = 20;
}
