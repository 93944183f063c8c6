//! SSD1306 OLED driver for slow, flaky I2C links.
//!
//! The driver keeps the whole image in RAM ([`FrameBuffer`]) and pushes it to
//! the controller on [`Ssd1306::flush`]. Every transfer goes through
//! [`RetryingBus`], and the frame is sent in small chunks so that a failed
//! transfer only costs one chunk's worth of retries.
//!
//! # Wire format
//!
//! | Transaction | Bytes |
//! |-------------|-------|
//! | command | `[0x00, cmd]` |
//! | data | `[0x40, up to chunk_size frame bytes]` |
//!
//! Before each flush the column window is set to `0..=width-1` and the page
//! window to `0..=pages-1`, one byte per command transaction.
//!
//! # Example
//!
//! ```rust
//! use tekenrobot::bus::RetryingBus;
//! use tekenrobot::display::Ssd1306;
//! use tekenrobot::hal::{MockDelay, MockI2c};
//!
//! let bus = RetryingBus::new(MockI2c::new(), MockDelay::new(), 0x3C);
//! let mut oled = Ssd1306::new(bus, 128, 64).unwrap();
//! oled.initialize().unwrap();
//!
//! oled.draw_text("Hello", 0, 0);
//! oled.set_pixel(124, 0, true).unwrap();
//! oled.flush().unwrap();
//! ```

pub mod command;
mod frame;

pub use frame::{FrameBuffer, MAX_HEIGHT, MAX_WIDTH};

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use thiserror::Error;

use crate::bus::{BusError, RetryingBus};
use crate::config::DisplayConfig;
use command::{CONTROL_COMMAND, CONTROL_DATA, INIT_SEQUENCE, SET_COLUMN_ADDRESS, SET_PAGE_ADDRESS};

/// Largest data chunk the driver will put in one transaction.
pub const MAX_CHUNK_SIZE: usize = 128;

/// Display driver errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// The bus gave up on a command or data transfer.
    #[error("display bus failure: {0}")]
    Bus(#[from] BusError),

    /// Pixel coordinate outside the panel.
    #[error("pixel ({x}, {y}) is outside the panel")]
    OutOfBounds {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },

    /// Panel size the controller cannot address.
    #[error("unsupported panel geometry {width}x{height}")]
    InvalidGeometry {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Bus pacing for commands and frame transfers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pacing {
    /// Pause after every command byte.
    pub command_settle_ms: u32,
    /// Frame bytes per data transaction, `1..=MAX_CHUNK_SIZE`.
    pub chunk_size: usize,
    /// Pause after every data transaction.
    pub chunk_gap_ms: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            command_settle_ms: 2,
            chunk_size: 32,
            chunk_gap_ms: 1,
        }
    }
}

/// Buffered SSD1306 driver.
///
/// Owns the bus and the frame. Drawing only touches RAM; nothing reaches
/// the panel until [`flush`](Self::flush).
pub struct Ssd1306<I2C, D> {
    bus: RetryingBus<I2C, D>,
    frame: FrameBuffer,
    pacing: Pacing,
}

impl<I2C: I2c, D: DelayNs> Ssd1306<I2C, D> {
    /// Creates a driver with a cleared frame. Does not talk to the panel.
    pub fn new(bus: RetryingBus<I2C, D>, width: u32, height: u32) -> Result<Self, DisplayError> {
        Ok(Self {
            bus,
            frame: FrameBuffer::new(width, height)?,
            pacing: Pacing::default(),
        })
    }

    /// Creates a driver sized and paced from configuration.
    pub fn from_config(bus: RetryingBus<I2C, D>, config: &DisplayConfig) -> Result<Self, DisplayError> {
        Ok(Self::new(bus, config.width, config.height)?.with_pacing(config.pacing))
    }

    /// Replaces the bus pacing. `chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = Pacing {
            chunk_size: pacing.chunk_size.clamp(1, MAX_CHUNK_SIZE),
            ..pacing
        };
        self
    }

    /// Runs the controller power-up sequence, then blanks the panel.
    pub fn initialize(&mut self) -> Result<(), DisplayError> {
        for cmd in INIT_SEQUENCE {
            self.command(cmd)?;
        }
        self.fill(false);
        self.flush()?;

        tracing::info!(
            address = self.bus.address(),
            width = self.frame.width(),
            height = self.frame.height(),
            "display initialized"
        );
        Ok(())
    }

    /// Sends one command byte and waits for it to settle.
    pub fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.bus.send(&[CONTROL_COMMAND, cmd])?;
        self.bus.pause_ms(self.pacing.command_settle_ms);
        Ok(())
    }

    /// Sets every pixel on or off.
    pub fn fill(&mut self, on: bool) {
        self.frame.fill(on);
    }

    /// Sets one pixel. Coordinates outside the panel are rejected.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) -> Result<(), DisplayError> {
        self.frame.set(x, y, on)
    }

    /// Reads one pixel back from the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        self.frame.get(x, y)
    }

    /// Draws ASCII text in the 6x10 font with its top-left corner at `(x, y)`.
    ///
    /// Only lit glyph pixels are written; glyph parts off the panel are
    /// clipped.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.frame);
    }

    /// Transfers the whole frame to the panel.
    ///
    /// Sets the column and page windows, then streams the frame in
    /// `chunk_size` pieces. A failure part way leaves the panel showing
    /// whatever the completed chunks wrote.
    pub fn flush(&mut self) -> Result<(), DisplayError> {
        let last_column = (self.frame.width() - 1) as u8;
        let last_page = (self.frame.pages() - 1) as u8;
        for cmd in [SET_COLUMN_ADDRESS, 0, last_column, SET_PAGE_ADDRESS, 0, last_page] {
            self.command(cmd)?;
        }

        let mut packet = [0u8; MAX_CHUNK_SIZE + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.frame.as_bytes().chunks(self.pacing.chunk_size) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.bus.send(&packet[..=chunk.len()])?;
            self.bus.pause_ms(self.pacing.chunk_gap_ms);
        }
        Ok(())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Number of 8-row pages.
    pub fn pages(&self) -> u32 {
        self.frame.pages()
    }

    /// Current bus pacing.
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// The in-memory frame.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Mutable frame access for `embedded-graphics` drawing.
    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    /// The bus the panel sits on.
    pub fn bus(&self) -> &RetryingBus<I2C, D> {
        &self.bus
    }

    /// Gives back the bus.
    pub fn release(self) -> RetryingBus<I2C, D> {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockI2c};

    type TestDisplay = Ssd1306<MockI2c, MockDelay>;

    fn display() -> TestDisplay {
        display_on(MockI2c::new())
    }

    fn display_on(i2c: MockI2c) -> TestDisplay {
        let bus = RetryingBus::new(i2c, MockDelay::new(), 0x3C);
        Ssd1306::new(bus, 128, 64).unwrap()
    }

    fn writes(display: TestDisplay) -> Vec<Vec<u8>> {
        let (i2c, _) = display.release().release();
        i2c.writes().iter().map(|(_, bytes)| bytes.clone()).collect()
    }

    #[test]
    fn initialize_sends_sequence_then_blank_frame() {
        let mut oled = display();
        oled.fill(true);
        oled.initialize().unwrap();
        assert!(oled.frame().as_bytes().iter().all(|&b| b == 0));

        let writes = writes(oled);
        let commands: Vec<u8> = writes[..25].iter().map(|w| w[1]).collect();
        assert!(writes[..25].iter().all(|w| w.len() == 2 && w[0] == 0x00));
        assert_eq!(commands, INIT_SEQUENCE);

        // window + 32 chunks of blank frame
        assert_eq!(writes.len(), 25 + 6 + 32);
        assert!(writes[31..]
            .iter()
            .all(|w| w[0] == 0x40 && w[1..].iter().all(|&b| b == 0)));
    }

    #[test]
    fn initialize_settles_after_every_command() {
        let mut oled = display();
        oled.initialize().unwrap();
        let (_, delay) = oled.release().release();
        // 25 init + 6 window commands at 2 ms, 32 chunk gaps at 1 ms
        assert_eq!(delay.total_ms(), 31 * 2 + 32);
    }

    #[test]
    fn flush_sets_window_before_data() {
        let mut oled = display();
        oled.flush().unwrap();
        let writes = writes(oled);

        let window: Vec<Vec<u8>> = writes[..6].to_vec();
        assert_eq!(
            window,
            vec![
                vec![0x00, 0x21],
                vec![0x00, 0],
                vec![0x00, 127],
                vec![0x00, 0x22],
                vec![0x00, 0],
                vec![0x00, 7],
            ]
        );
    }

    #[test]
    fn flush_streams_frame_in_order() {
        let mut oled = display();
        oled.set_pixel(0, 0, true).unwrap();
        oled.set_pixel(127, 63, true).unwrap();
        let expected = oled.frame().as_bytes().to_vec();
        oled.flush().unwrap();

        let writes = writes(oled);
        let data: Vec<u8> = writes[6..]
            .iter()
            .flat_map(|w| {
                assert_eq!(w[0], 0x40);
                w[1..].to_vec()
            })
            .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn flush_uses_configured_chunk_size() {
        let pacing = Pacing {
            chunk_size: 100,
            ..Pacing::default()
        };
        let mut oled = display().with_pacing(pacing);
        oled.flush().unwrap();
        let writes = writes(oled);

        let data = &writes[6..];
        assert_eq!(data.len(), 11); // ceil(1024 / 100)
        assert!(data[..10].iter().all(|w| w.len() == 101));
        assert_eq!(data[10].len(), 25);
    }

    #[test]
    fn oversized_chunk_is_clamped() {
        let pacing = Pacing {
            chunk_size: 4096,
            ..Pacing::default()
        };
        let oled = display().with_pacing(pacing);
        assert_eq!(oled.pacing().chunk_size, MAX_CHUNK_SIZE);

        let oled = display().with_pacing(Pacing {
            chunk_size: 0,
            ..Pacing::default()
        });
        assert_eq!(oled.pacing().chunk_size, 1);
    }

    #[test]
    fn small_panel_window() {
        let bus = RetryingBus::new(MockI2c::new(), MockDelay::new(), 0x3C);
        let mut oled = Ssd1306::new(bus, 128, 32).unwrap();
        oled.flush().unwrap();
        let writes = writes(oled);
        assert_eq!(writes[2], vec![0x00, 127]);
        assert_eq!(writes[5], vec![0x00, 3]);
        assert_eq!(writes.len(), 6 + 16);
    }

    #[test]
    fn transient_failures_during_flush_are_absorbed() {
        let mut oled = display_on(MockI2c::new().fail_next(5));
        oled.flush().unwrap();
        let (i2c, _) = oled.release().release();
        assert_eq!(i2c.writes().len(), 6 + 32);
        assert_eq!(i2c.attempts(), 6 + 32 + 5);
    }

    #[test]
    fn persistent_failure_aborts_flush() {
        let mut oled = display_on(MockI2c::new().fail_after(10));
        let err = oled.flush().unwrap_err();
        assert!(matches!(err, DisplayError::Bus(BusError::Exhausted { .. })));

        let (i2c, _) = oled.release().release();
        // 6 window commands and 4 chunks got through before the device died
        assert_eq!(i2c.writes().len(), 10);
    }

    #[test]
    fn text_is_drawn_from_top_left() {
        let mut oled = display();
        oled.draw_text("I", 0, 0);
        let lit: Vec<(u32, u32)> = (0..10)
            .flat_map(|y| (0..6).map(move |x| (x, y)))
            .filter(|&(x, y)| oled.pixel(x, y) == Some(true))
            .collect();
        assert!(!lit.is_empty());
        // Nothing below the 10 px glyph cell.
        assert!((0..128).all(|x| (10..64).all(|y| oled.pixel(x, y) == Some(false))));
    }

    #[test]
    fn text_off_panel_is_clipped() {
        let mut oled = display();
        oled.draw_text("VPC Tekenrobot Gereed Druk knop", 100, 60);
        oled.draw_text("x", -20, -20);
        assert_eq!(oled.frame().as_bytes().len(), 1024);
    }

    #[test]
    fn set_pixel_out_of_range_is_rejected() {
        let mut oled = display();
        assert_eq!(
            oled.set_pixel(128, 64, true),
            Err(DisplayError::OutOfBounds { x: 128, y: 64 })
        );
    }

    #[test]
    fn from_config_applies_geometry_and_pacing() {
        let config = DisplayConfig::default().with_height(32).with_chunk_size(16);
        let bus = RetryingBus::new(MockI2c::new(), MockDelay::new(), config.address);
        let oled = Ssd1306::from_config(bus, &config).unwrap();
        assert_eq!(oled.height(), 32);
        assert_eq!(oled.pages(), 4);
        assert_eq!(oled.pacing().chunk_size, 16);
    }

    #[test]
    fn from_config_rejects_bad_geometry() {
        let config = DisplayConfig::default().with_height(12);
        let bus = RetryingBus::new(MockI2c::new(), MockDelay::new(), 0x3C);
        assert!(matches!(
            Ssd1306::from_config(bus, &config),
            Err(DisplayError::InvalidGeometry { .. })
        ));
    }
}
