//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every hardware seam the station
//! uses, enabling development and testing on desktop without a board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockI2c`] | [`I2c`] | Records writes, injects NACKs |
//! | [`MockDelay`] | [`DelayNs`] | Records sleeps, optionally drives a [`MockClock`] |
//! | [`MockClock`] | [`Clock`] | Controllable shared time source |
//! | [`MockInput`] | [`InputPin`] | Button level settable through a shared handle |
//! | [`MockLed`] | [`StatefulOutputPin`] | Tracks level and toggle count |
//! | [`MockPwm`] | [`SetDutyCycle`] | Records duty history |
//! | [`MockDisplay`] | [`StatusDisplay`] | Records shown screens |
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
//! let (i2c, _) = oled.release().release();
//! // 25 init commands, then a blank frame: 6 window commands and 32 chunks
//! assert_eq!(i2c.writes().len(), 25 + 6 + 32);
//! assert!(i2c.writes().iter().all(|(address, _)| *address == 0x3C));
//! ```
//!
//! [`Clock`]: crate::traits::Clock
//! [`StatusDisplay`]: crate::traits::StatusDisplay

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as DigitalErrorType, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{self, ErrorType as I2cErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};
use embedded_hal::pwm::{self, ErrorType as PwmErrorType, SetDutyCycle};

use crate::render::Screen;
use crate::traits::{Clock, StatusDisplay};

// ============================================================================
// Bus Mocks
// ============================================================================

/// Mock I2C bus.
///
/// Every write attempt is counted; successful writes are recorded with
/// their address and payload. Failures report
/// `NoAcknowledge(Address)`, the way an absent or busy panel does.
///
/// # Example
///
/// ```rust
/// use embedded_hal::i2c::I2c;
/// use tekenrobot::hal::MockI2c;
///
/// let mut i2c = MockI2c::new().fail_next(1);
/// assert!(i2c.write(0x3C, &[0x00, 0xAE]).is_err());
/// assert!(i2c.write(0x3C, &[0x00, 0xAE]).is_ok());
///
/// assert_eq!(i2c.attempts(), 2);
/// assert_eq!(i2c.writes().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockI2c {
    writes: Vec<(u8, Vec<u8>)>,
    attempts: usize,
    fail_next: usize,
    fail_after: Option<usize>,
}

impl MockI2c {
    /// Creates a bus on which every write succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` write attempts fail.
    pub fn fail_next(mut self, n: usize) -> Self {
        self.fail_next = n;
        self
    }

    /// Every write attempt fails.
    pub fn fail_always(self) -> Self {
        self.fail_after(0)
    }

    /// The first `n` writes succeed, every later attempt fails.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of write attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Successful writes as `(address, payload)`.
    pub fn writes(&self) -> &[(u8, Vec<u8>)] {
        &self.writes
    }

    fn should_fail(&mut self) -> bool {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        self.fail_after.is_some_and(|n| self.writes.len() >= n)
    }
}

impl I2cErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c<SevenBitAddress> for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.attempts += 1;
                    if self.should_fail() {
                        return Err(i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    self.writes.push((address, bytes.to_vec()));
                }
                Operation::Read(buffer) => buffer.fill(0),
            }
        }
        Ok(())
    }
}

// ============================================================================
// Time Mocks
// ============================================================================

/// Mock clock for testing.
///
/// Clones share the same time, so a test can keep a handle while the
/// control loop owns another (or a [`MockDelay`] advances it).
///
/// # Example
///
/// ```rust
/// use tekenrobot::hal::MockClock;
/// use tekenrobot::traits::Clock;
///
/// let clock = MockClock::new();
/// let handle = clock.clone();
///
/// handle.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// handle.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    current_ms: Rc<Cell<u64>>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    /// Advances the clock by the given duration, wrapping on overflow.
    pub fn advance(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }
}

/// Mock delay provider.
///
/// Returns immediately and records each sleep in milliseconds (sub-ms
/// sleeps round up). When built with [`with_clock`](Self::with_clock),
/// every sleep also advances that clock.
#[derive(Debug, Default)]
pub struct MockDelay {
    calls: Vec<u32>,
    clock: Option<MockClock>,
}

impl MockDelay {
    /// Creates a delay that only records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a delay that advances `clock` by each sleep.
    pub fn with_clock(clock: MockClock) -> Self {
        Self {
            calls: Vec::new(),
            clock: Some(clock),
        }
    }

    /// Every sleep so far, in milliseconds.
    pub fn calls(&self) -> &[u32] {
        &self.calls
    }

    /// Sum of all sleeps.
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| u64::from(ms)).sum()
    }

    /// Forgets recorded sleeps.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, ms: u32) {
        self.calls.push(ms);
        if let Some(clock) = &self.clock {
            clock.advance(u64::from(ms));
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.record(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}

// ============================================================================
// GPIO Mocks
// ============================================================================

/// Mock push button.
///
/// Idle low, high while pressed. Clones share the level, so a test keeps
/// one handle to press and release while the actuator set owns the other.
///
/// # Example
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use tekenrobot::hal::MockInput;
///
/// let mut pin = MockInput::new();
/// let button = pin.clone();
///
/// assert!(pin.is_low().unwrap());
/// button.press();
/// assert!(pin.is_high().unwrap());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockInput {
    high: Rc<Cell<bool>>,
    reads: Rc<Cell<usize>>,
    failing: bool,
}

impl MockInput {
    /// Creates a released button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pin whose reads always fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Drives the pin high.
    pub fn press(&self) {
        self.high.set(true);
    }

    /// Drives the pin low.
    pub fn release(&self) {
        self.high.set(false);
    }

    /// Current level.
    pub fn is_pressed(&self) -> bool {
        self.high.get()
    }

    /// Number of level reads so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn read(&mut self) -> Result<bool, digital::ErrorKind> {
        self.reads.set(self.reads.get() + 1);
        if self.failing {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.high.get())
    }
}

impl DigitalErrorType for MockInput {
    type Error = digital::ErrorKind;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|high| !high)
    }
}

/// Mock status LED.
#[derive(Debug, Default)]
pub struct MockLed {
    on: bool,
    toggles: usize,
    failing: bool,
}

impl MockLed {
    /// Creates an LED that starts off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an LED whose every operation fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Current level.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Number of successful toggles.
    pub fn toggle_count(&self) -> usize {
        self.toggles
    }

    fn check(&self) -> Result<(), digital::ErrorKind> {
        if self.failing {
            Err(digital::ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

impl DigitalErrorType for MockLed {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.on = true;
        Ok(())
    }
}

impl StatefulOutputPin for MockLed {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.on)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(!self.on)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.on = !self.on;
        self.toggles += 1;
        Ok(())
    }
}

// ============================================================================
// PWM Mocks
// ============================================================================

/// Mock PWM output.
///
/// Full-scale duty defaults to 65535 so the recorded values are the 16-bit
/// duties the servo module computes.
///
/// # Example
///
/// ```rust
/// use embedded_hal::pwm::SetDutyCycle;
/// use tekenrobot::hal::MockPwm;
///
/// let mut pwm = MockPwm::new();
/// pwm.set_duty_cycle(1638).unwrap();
/// pwm.set_duty_cycle(8192).unwrap();
///
/// assert_eq!(pwm.duty(), 8192);
/// assert_eq!(pwm.history(), &[1638, 8192]);
/// ```
#[derive(Debug)]
pub struct MockPwm {
    max_duty: u16,
    history: Vec<u16>,
    fail_after: Option<usize>,
}

impl MockPwm {
    /// Creates an output with a 16-bit duty range.
    pub fn new() -> Self {
        Self::with_max_duty(u16::MAX)
    }

    /// Creates an output with a custom full-scale duty.
    pub fn with_max_duty(max_duty: u16) -> Self {
        Self {
            max_duty,
            history: Vec::new(),
            fail_after: None,
        }
    }

    /// The first `n` writes succeed, every later one fails.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Last duty written, 0 if none.
    pub fn duty(&self) -> u16 {
        self.history.last().copied().unwrap_or(0)
    }

    /// Every duty written, oldest first.
    pub fn history(&self) -> &[u16] {
        &self.history
    }
}

impl Default for MockPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail_after.is_some_and(|n| self.history.len() >= n) {
            return Err(pwm::ErrorKind::Other);
        }
        self.history.push(duty);
        Ok(())
    }
}

// ============================================================================
// Display Mocks
// ============================================================================

/// Error returned by a [`MockDisplay`] after its failure point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockDisplayError;

/// Mock status display for testing.
///
/// # Example
///
/// ```rust
/// use tekenrobot::hal::MockDisplay;
/// use tekenrobot::render::Screen;
/// use tekenrobot::traits::StatusDisplay;
///
/// let mut display = MockDisplay::new();
/// display.show(&Screen::new("a", "b", ""), true).unwrap();
///
/// assert_eq!(display.render_count(), 1);
/// assert_eq!(display.last(), Some(&(Screen::new("a", "b", ""), true)));
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Every screen shown, with the indicator state, oldest first.
    pub shown: Vec<(Screen, bool)>,
    fail_after: Option<usize>,
}

impl MockDisplay {
    /// Creates a mock display.
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `n` renders succeed, every later one fails.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Most recent screen.
    pub fn last(&self) -> Option<&(Screen, bool)> {
        self.shown.last()
    }

    /// Number of successful renders.
    pub fn render_count(&self) -> usize {
        self.shown.len()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = MockDisplayError;

    fn show(&mut self, screen: &Screen, indicator_on: bool) -> Result<(), Self::Error> {
        if self.fail_after.is_some_and(|n| self.shown.len() >= n) {
            return Err(MockDisplayError);
        }
        self.shown.push((screen.clone(), indicator_on));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c_fail_next_then_recovers() {
        let mut i2c = MockI2c::new().fail_next(2);
        assert!(i2c.write(0x3C, &[1]).is_err());
        assert!(i2c.write(0x3C, &[2]).is_err());
        assert!(i2c.write(0x3C, &[3]).is_ok());
        assert_eq!(i2c.attempts(), 3);
        assert_eq!(i2c.writes(), &[(0x3C, vec![3])]);
    }

    #[test]
    fn i2c_fail_after_counts_successes() {
        let mut i2c = MockI2c::new().fail_after(1);
        assert!(i2c.write(0x3C, &[1]).is_ok());
        assert_eq!(
            i2c.write(0x3C, &[2]),
            Err(i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert!(i2c.write(0x3C, &[3]).is_err());
        assert_eq!(i2c.writes().len(), 1);
    }

    #[test]
    fn delay_rounds_up_and_drives_clock() {
        let clock = MockClock::new();
        let mut delay = MockDelay::with_clock(clock.clone());
        delay.delay_ms(5);
        delay.delay_us(1_500);
        delay.delay_ns(1);
        assert_eq!(delay.calls(), &[5, 2, 1]);
        assert_eq!(delay.total_ms(), 8);
        assert_eq!(clock.now_ms(), 8);
    }

    #[test]
    fn clock_clones_share_time() {
        let clock = MockClock::new();
        let other = clock.clone();
        clock.advance(42);
        assert_eq!(other.now_ms(), 42);
    }

    #[test]
    fn clock_advance_wraps() {
        let clock = MockClock::new();
        clock.set(u64::MAX);
        clock.advance(2);
        assert_eq!(clock.now_ms(), 1);
    }

    #[test]
    fn input_handle_drives_level() {
        let mut pin = MockInput::new();
        let handle = pin.clone();
        handle.press();
        assert!(pin.is_high().unwrap());
        handle.release();
        assert!(pin.is_low().unwrap());
        assert_eq!(handle.reads(), 2);
    }

    #[test]
    fn failing_input_reports_error() {
        let mut pin = MockInput::failing();
        assert_eq!(pin.is_high(), Err(digital::ErrorKind::Other));
    }

    #[test]
    fn led_set_and_toggle() {
        let mut led = MockLed::new();
        led.set_high().unwrap();
        assert!(led.is_set_high().unwrap());
        led.toggle().unwrap();
        assert!(!led.is_on());
        assert_eq!(led.toggle_count(), 1);
    }

    #[test]
    fn pwm_scales_fraction() {
        let mut pwm = MockPwm::with_max_duty(1000);
        pwm.set_duty_cycle_percent(50).unwrap();
        assert_eq!(pwm.duty(), 500);
    }

    #[test]
    fn pwm_fails_after_limit() {
        let mut pwm = MockPwm::new().fail_after(1);
        pwm.set_duty_cycle(1).unwrap();
        assert_eq!(pwm.set_duty_cycle(2), Err(pwm::ErrorKind::Other));
        assert_eq!(pwm.history(), &[1]);
    }

    #[test]
    fn display_fails_after_limit() {
        let mut display = MockDisplay::new().fail_after(1);
        let screen = Screen::default();
        display.show(&screen, false).unwrap();
        assert_eq!(display.show(&screen, true), Err(MockDisplayError));
        assert_eq!(display.render_count(), 1);
    }
}
