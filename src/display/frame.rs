//! In-memory monochrome frame in the controller's native page layout.

use alloc::boxed::Box;
use alloc::vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::DisplayError;

/// Largest panel the controller addresses.
pub const MAX_WIDTH: u32 = 128;
/// Largest panel the controller addresses.
pub const MAX_HEIGHT: u32 = 64;

/// Pixel buffer packed MONO_VLSB: one byte per (page, column), eight
/// vertically stacked pixels per byte, least significant bit on top.
///
/// The length is fixed at `pages * width` for the lifetime of the buffer.
///
/// ```rust
/// use tekenrobot::display::FrameBuffer;
///
/// let mut frame = FrameBuffer::new(128, 64).unwrap();
/// assert_eq!(frame.as_bytes().len(), 1024);
///
/// frame.set(3, 10, true).unwrap();
/// assert_eq!(frame.get(3, 10), Some(true));
/// // page 1, column 3, bit 2
/// assert_eq!(frame.as_bytes()[128 + 3], 0b0000_0100);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes: Box<[u8]>,
}

impl FrameBuffer {
    /// Allocates a cleared frame.
    ///
    /// Width must be in `1..=128`; height a multiple of 8 in `8..=64`.
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        let valid = (1..=MAX_WIDTH).contains(&width)
            && (8..=MAX_HEIGHT).contains(&height)
            && height % 8 == 0;
        if !valid {
            return Err(DisplayError::InvalidGeometry { width, height });
        }

        let len = (height / 8 * width) as usize;
        Ok(Self {
            width,
            height,
            bytes: vec![0u8; len].into_boxed_slice(),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of 8-row pages.
    pub fn pages(&self) -> u32 {
        self.height / 8
    }

    /// Raw bytes in transmission order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Sets every pixel on or off.
    pub fn fill(&mut self, on: bool) {
        self.bytes.fill(if on { 0xFF } else { 0x00 });
    }

    /// Sets a single pixel.
    pub fn set(&mut self, x: u32, y: u32, on: bool) -> Result<(), DisplayError> {
        let (index, mask) = self.locate(x, y).ok_or(DisplayError::OutOfBounds { x, y })?;
        if on {
            self.bytes[index] |= mask;
        } else {
            self.bytes[index] &= !mask;
        }
        Ok(())
    }

    /// Reads a single pixel, `None` outside the panel.
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        self.locate(x, y)
            .map(|(index, mask)| self.bytes[index] & mask != 0)
    }

    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y / 8 * self.width + x) as usize;
        Some((index, 1 << (y % 8)))
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

// Off-panel pixels are clipped, as DrawTarget requires.
impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                let _ = self.set(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.is_on());
        Ok(())
    }
}
