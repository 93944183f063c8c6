//! Hardware abstraction traits that `embedded-hal` does not cover.
//!
//! The bus, buttons, servo PWM and blocking delays all use the
//! `embedded-hal` 1.0 traits directly. This module adds the two seams the
//! control station needs on top of that:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Clock`] | Monotonic millisecond tick for the blink timer |
//! | [`StatusLeds`] | The LEDs that blink together with the indicator |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use tekenrobot::traits::{Clock, StatusLeds};
//! use tekenrobot::hal::{MockClock, MockLed};
//!
//! let clock = MockClock::new();
//! clock.advance(300);
//! assert_eq!(clock.now_ms(), 300);
//!
//! let mut leds = (MockLed::new(), MockLed::new());
//! leds.toggle_all().unwrap();
//! assert!(leds.0.is_on());
//! assert!(leds.1.is_on());
//! ```

use embedded_hal::digital::{self, Error as _, StatefulOutputPin};

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for the blink timer. On
/// embedded, use a hardware timer; tests use [`MockClock`].
///
/// [`MockClock`]: crate::hal::MockClock
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing (modulo wrap-around, which callers
    /// handle with wrapping subtraction).
    fn now_ms(&self) -> u64;
}

/// Status LEDs that are toggled on every blink.
///
/// Implemented for a pair of [`StatefulOutputPin`]s (the reference board
/// has an onboard and an external LED) and for `()` when a build has no
/// LEDs at all.
pub trait StatusLeds {
    /// Inverts every LED.
    fn toggle_all(&mut self) -> Result<(), digital::ErrorKind>;
}

impl StatusLeds for () {
    fn toggle_all(&mut self) -> Result<(), digital::ErrorKind> {
        Ok(())
    }
}

impl<A: StatefulOutputPin, B: StatefulOutputPin> StatusLeds for (A, B) {
    fn toggle_all(&mut self) -> Result<(), digital::ErrorKind> {
        self.0.toggle().map_err(|e| e.kind())?;
        self.1.toggle().map_err(|e| e.kind())
    }
}
