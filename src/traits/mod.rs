//! Trait definitions for the station's hardware seams.
//!
//! This module defines the abstractions that allow tekenrobot to run on
//! different hardware (ESP32, desktop mock):
//!
//! # Submodules
//!
//! - `hardware`: Clock and status LEDs
//! - `display`: Status screen rendering
//!
//! Everything else (I2C, buttons, PWM, delays) goes through the
//! `embedded-hal` 1.0 traits, which the mocks in [`crate::hal`] implement.

pub mod display;
pub mod hardware;

pub use display::*;
pub use hardware::*;
