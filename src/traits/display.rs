//! Display abstraction for the station's status screen.
//!
//! This module defines the [`StatusDisplay`] trait the control loop draws
//! through. The SSD1306 driver implements it in [`crate::render`]; tests use
//! [`MockDisplay`](crate::hal::MockDisplay).

use crate::render::Screen;

/// Display trait for the three-line status screen.
///
/// # Example
///
/// ```ignore
/// use tekenrobot::render::Screen;
/// use tekenrobot::traits::StatusDisplay;
///
/// struct MyDisplay { /* ... */ }
///
/// impl StatusDisplay for MyDisplay {
///     type Error = ();
///
///     fn show(&mut self, screen: &Screen, indicator_on: bool) -> Result<(), ()> {
///         // Draw the lines and the indicator, then push to the panel.
///         Ok(())
///     }
/// }
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error: core::fmt::Debug;

    /// Replaces everything on the panel with `screen` and the blink
    /// indicator in the given state.
    fn show(&mut self, screen: &Screen, indicator_on: bool) -> Result<(), Self::Error>;
}
