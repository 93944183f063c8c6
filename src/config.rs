//! Boot-time configuration for the station.
//!
//! Every value here is fixed when the firmware starts; nothing is read back
//! from storage. Uses `heapless::String` for `no_std` compatibility while
//! remaining ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use tekenrobot::config::{Config, DisplayConfig, LoopConfig};
//!
//! // Use the reference deployment
//! let config = Config::default();
//! assert_eq!(config.display.address, 0x3C);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_display(DisplayConfig::default().with_chunk_size(16))
//!     .with_control(LoopConfig::default().with_blink_interval_ms(500));
//! ```

use heapless::String as HString;

use crate::bus::RetryPolicy;
use crate::display::command::DEFAULT_ADDRESS;
use crate::display::Pacing;
use crate::servo::{DutyRange, SweepProfile};

/// Maximum length for config strings (screen texts)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Copies as much of `s` as fits in `N` bytes, cutting at a char boundary.
pub fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= N)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete station configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// OLED panel and its bus
    pub display: DisplayConfig,
    /// Servo PWM and sweep motion
    pub servo: ServoConfig,
    /// Control loop timing
    pub control: LoopConfig,
    /// Screen texts
    pub texts: TextConfig,
}

impl Config {
    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set servo configuration
    pub fn with_servo(mut self, servo: ServoConfig) -> Self {
        self.servo = servo;
        self
    }

    /// Set control loop configuration
    pub fn with_control(mut self, control: LoopConfig) -> Self {
        self.control = control;
        self
    }

    /// Set screen texts
    pub fn with_texts(mut self, texts: TextConfig) -> Self {
        self.texts = texts;
        self
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// OLED panel and I2C link configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels (multiple of 8)
    pub height: u32,
    /// Bus clock. Kept low because the reference panel times out above it.
    pub bus_frequency_hz: u32,
    /// Retry budget per transaction
    pub retry: RetryPolicy,
    /// Command settle time and frame chunking
    pub pacing: Pacing,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            width: 128,
            height: 64,
            bus_frequency_hz: 20_000,
            retry: RetryPolicy::default(),
            pacing: Pacing::default(),
        }
    }
}

impl DisplayConfig {
    /// Set the I2C address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the panel width
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the panel height
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the bus clock
    pub fn with_bus_frequency_hz(mut self, hz: u32) -> Self {
        self.bus_frequency_hz = hz;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the data chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.pacing.chunk_size = chunk_size;
        self
    }

    /// Set the full pacing
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}

// ============================================================================
// Servo Config
// ============================================================================

/// Servo PWM and sweep configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoConfig {
    /// PWM frequency (analog servos expect 50 Hz)
    pub frequency_hz: u32,
    /// 16-bit duty values for 0 and 180 degrees
    pub duty: DutyRange,
    /// Sweep step and pace
    pub sweep: SweepProfile,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 50,
            duty: DutyRange::default(),
            sweep: SweepProfile::default(),
        }
    }
}

impl ServoConfig {
    /// Set the PWM frequency
    pub fn with_frequency_hz(mut self, hz: u32) -> Self {
        self.frequency_hz = hz;
        self
    }

    /// Set the duty range
    pub fn with_duty(mut self, duty: DutyRange) -> Self {
        self.duty = duty;
        self
    }

    /// Set the sweep profile
    pub fn with_sweep(mut self, sweep: SweepProfile) -> Self {
        self.sweep = sweep;
        self
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Control loop timing
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Blink fires once the tick has moved past the last toggle by more than this
    pub blink_interval_ms: u64,
    /// Sleep at the end of every iteration
    pub idle_sleep_ms: u32,
    /// Sleep between polls while waiting for a button release
    pub release_poll_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            blink_interval_ms: 300,
            idle_sleep_ms: 5,
            release_poll_ms: 10,
        }
    }
}

impl LoopConfig {
    /// Set the blink interval
    pub fn with_blink_interval_ms(mut self, ms: u64) -> Self {
        self.blink_interval_ms = ms;
        self
    }

    /// Set the idle sleep
    pub fn with_idle_sleep_ms(mut self, ms: u32) -> Self {
        self.idle_sleep_ms = ms;
        self
    }

    /// Set the release poll interval
    pub fn with_release_poll_ms(mut self, ms: u32) -> Self {
        self.release_poll_ms = ms;
        self
    }
}

// ============================================================================
// Text Config
// ============================================================================

/// Screen texts
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextConfig {
    /// First line of the idle screen
    pub title: ShortString,
    /// Second line of the idle screen
    pub ready: ShortString,
    /// Third line of the idle screen before any movement
    pub prompt: ShortString,
    /// First line while a servo moves
    pub active: ShortString,
    /// Prefix of the actuator id on the second line while a servo moves
    pub actuator_label: ShortString,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            title: short_string("VPC Tekenrobot"),
            ready: short_string("Gereed"),
            prompt: short_string("Druk knop"),
            active: short_string("Servo actief"),
            actuator_label: short_string("GPIO"),
        }
    }
}

impl TextConfig {
    /// Set the title line
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = short_string(title);
        self
    }

    /// Set the ready line
    pub fn with_ready(mut self, ready: &str) -> Self {
        self.ready = short_string(ready);
        self
    }

    /// Set the prompt line
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = short_string(prompt);
        self
    }

    /// Set the active line
    pub fn with_active(mut self, active: &str) -> Self {
        self.active = short_string(active);
        self
    }

    /// Set the actuator label
    pub fn with_actuator_label(mut self, label: &str) -> Self {
        self.actuator_label = short_string(label);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
