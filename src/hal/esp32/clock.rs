//! Millisecond tick from the ESP-IDF high resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// `esp_timer_get_time()` counts microseconds in 64 bits, so the blink
/// timer never sees a wrap in practice.
///
/// # Example
///
/// ```ignore
/// use tekenrobot::hal::esp32::Esp32Clock;
/// use tekenrobot::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let last_blink = clock.now_ms();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a clock handle.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Safe: reads the free-running system timer.
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
