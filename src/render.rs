//! Status screen composition.
//!
//! The panel only ever shows one layout: up to three text lines on the left
//! and a 3x3 blink indicator in the top-right corner.
//!
//! ```text
//! ┌────────────────────────────┐
//! │VPC Tekenrobot           ■  │  y = 0, indicator at (124, 0)
//! │                            │
//! │Gereed                      │  y = 16
//! │                            │
//! │Druk knop                   │  y = 32
//! │                            │
//! └────────────────────────────┘
//! ```

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::{truncated, TextConfig, MAX_SHORT_STRING};
use crate::display::{DisplayError, Ssd1306};
use crate::traits::StatusDisplay;

/// Characters that fit on one 128 px line in the 6 px font.
pub const LINE_CAPACITY: usize = 21;

/// Top edge of each text line.
pub const LINE_Y: [i32; 3] = [0, 16, 32];

/// Top-left corner of the blink indicator.
pub const INDICATOR_ORIGIN: (u32, u32) = (124, 0);

/// Indicator edge length in pixels.
pub const INDICATOR_SIZE: u32 = 3;

/// One line of screen text.
pub type Line = heapless::String<LINE_CAPACITY>;

/// Text content of the status screen.
///
/// Empty lines are left blank. Text longer than [`LINE_CAPACITY`] is cut at
/// a character boundary.
///
/// ```rust
/// use tekenrobot::config::TextConfig;
/// use tekenrobot::render::Screen;
///
/// let texts = TextConfig::default();
/// assert_eq!(Screen::ready(&texts).lines(), ["VPC Tekenrobot", "Gereed", "Druk knop"]);
/// assert_eq!(Screen::actuator_active(&texts, 13).lines(), ["Servo actief", "GPIO 13", ""]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    lines: [Line; 3],
}

impl Screen {
    /// Builds a screen from three lines of text.
    pub fn new(line1: &str, line2: &str, line3: &str) -> Self {
        Self {
            lines: [truncated(line1), truncated(line2), truncated(line3)],
        }
    }

    /// Idle screen asking for a button press.
    pub fn ready(texts: &TextConfig) -> Self {
        Self::new(&texts.title, &texts.ready, &texts.prompt)
    }

    /// Idle screen shown right after a sweep, without the prompt.
    pub fn ready_after_move(texts: &TextConfig) -> Self {
        Self::new(&texts.title, &texts.ready, "")
    }

    /// Screen shown while actuator `id` sweeps.
    pub fn actuator_active(texts: &TextConfig, id: u8) -> Self {
        // Room for the longest label plus the id; Self::new trims to the line.
        let mut label = heapless::String::<{ MAX_SHORT_STRING + 4 }>::new();
        let _ = write!(label, "{} {}", texts.actuator_label, id);
        Self::new(&texts.active, &label, "")
    }

    /// The three lines, top to bottom.
    pub fn lines(&self) -> [&str; 3] {
        [
            self.lines[0].as_str(),
            self.lines[1].as_str(),
            self.lines[2].as_str(),
        ]
    }
}

/// Draws three lines and the indicator into the frame, then flushes it.
pub fn render<I2C: I2c, D: DelayNs>(
    display: &mut Ssd1306<I2C, D>,
    line1: &str,
    line2: &str,
    line3: &str,
    indicator_on: bool,
) -> Result<(), DisplayError> {
    display.fill(false);

    for (text, y) in [line1, line2, line3].into_iter().zip(LINE_Y) {
        if !text.is_empty() {
            display.draw_text(text, 0, y);
        }
    }

    let (x0, y0) = INDICATOR_ORIGIN;
    for dx in 0..INDICATOR_SIZE {
        for dy in 0..INDICATOR_SIZE {
            display.set_pixel(x0 + dx, y0 + dy, indicator_on)?;
        }
    }

    display.flush()
}

impl<I2C: I2c, D: DelayNs> StatusDisplay for Ssd1306<I2C, D> {
    type Error = DisplayError;

    fn show(&mut self, screen: &Screen, indicator_on: bool) -> Result<(), Self::Error> {
        let [line1, line2, line3] = screen.lines();
        render(self, line1, line2, line3, indicator_on)
    }
}
