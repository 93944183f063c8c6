//! SSD1306 wire constants.

/// Control byte: the following byte is a command.
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte: the following bytes are GDDRAM data.
pub const CONTROL_DATA: u8 = 0x40;

/// Set column address window (followed by start, end).
pub const SET_COLUMN_ADDRESS: u8 = 0x21;

/// Set page address window (followed by start, end).
pub const SET_PAGE_ADDRESS: u8 = 0x22;

/// Default 7-bit bus address of the module.
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Power-up sequence for a 128x64 panel with internal charge pump.
///
/// Sent one command per transaction, in this order.
pub const INIT_SEQUENCE: [u8; 25] = [
    0xAE, // display off
    0xD5, 0x80, // clock divide / oscillator
    0xA8, 0x3F, // multiplex ratio 64
    0xD3, 0x00, // display offset 0
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // segment remap
    0xC8, // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // precharge
    0xDB, 0x40, // VCOMH deselect level
    0xA4, // resume from RAM
    0xA6, // normal (not inverted)
    0xAF, // display on
];
