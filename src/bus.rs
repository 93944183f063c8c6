//! Addressed I2C writes with bounded retry.
//!
//! The display sits on a slow two-wire bus that intermittently refuses a
//! write (the device is busy, or the clock is stretched past the host's
//! timeout). [`RetryingBus`] absorbs those failures: it retries a write a
//! bounded number of times with a short pause in between, then makes one
//! last unguarded attempt whose failure is reported to the caller.
//!
//! ```rust
//! use tekenrobot::bus::{RetryingBus, RetryPolicy};
//! use tekenrobot::hal::{MockDelay, MockI2c};
//!
//! let i2c = MockI2c::new().fail_next(3);
//! let mut bus = RetryingBus::new(i2c, MockDelay::new(), 0x3C);
//!
//! bus.send(&[0x00, 0xAF]).unwrap();
//!
//! let (i2c, delay) = bus.release();
//! assert_eq!(i2c.attempts(), 4);
//! assert_eq!(delay.total_ms(), 3 * RetryPolicy::default().retry_delay_ms as u64);
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, Error as _, I2c};
use thiserror::Error;

/// How hard [`RetryingBus::send`] tries before giving up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Number of guarded attempts. One more unguarded attempt follows.
    pub attempts: u8,
    /// Pause after each failed guarded attempt.
    pub retry_delay_ms: u32,
}

impl RetryPolicy {
    /// Reference budget: 8 attempts, 5 ms apart.
    pub const DEFAULT: Self = Self {
        attempts: 8,
        retry_delay_ms: 5,
    };

    /// Upper bound on bus writes for a single `send`.
    pub const fn max_writes(&self) -> u16 {
        self.attempts as u16 + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bus failure that survived the retry budget.
///
/// Transient failures never escape [`RetryingBus::send`]; by the time one of
/// these is returned the device has refused every write in the budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BusError {
    /// A zero-length write was requested.
    #[error("refusing to send an empty payload")]
    EmptyPayload,

    /// Every attempt failed, including the final unguarded one.
    #[error("i2c write to {address:#04x} failed after {attempts} attempts: {kind:?}")]
    Exhausted {
        /// 7-bit device address.
        address: u8,
        /// Writes made, budget plus the final attempt.
        attempts: u16,
        /// Failure reported by the last attempt.
        kind: i2c::ErrorKind,
    },
}

/// I2C writer bound to one device address.
///
/// Owns the bus and the delay provider. The display driver borrows the delay
/// through [`pause_ms`](Self::pause_ms) for its settle and inter-chunk gaps,
/// so everything that blocks on the bus goes through this type.
pub struct RetryingBus<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    policy: RetryPolicy,
}

impl<I2C: I2c, D: DelayNs> RetryingBus<I2C, D> {
    /// Creates a bus for `address` with the reference [`RetryPolicy`].
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            policy: RetryPolicy::DEFAULT,
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Writes `payload` to the device in one transaction.
    ///
    /// Makes up to `policy.attempts` guarded writes, pausing
    /// `policy.retry_delay_ms` after each failure, then one final write whose
    /// error is returned as [`BusError::Exhausted`]. Returns as soon as any
    /// write succeeds.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), BusError> {
        if payload.is_empty() {
            return Err(BusError::EmptyPayload);
        }

        for attempt in 1..=self.policy.attempts {
            match self.i2c.write(self.address, payload) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(
                        address = self.address,
                        attempt,
                        kind = ?e.kind(),
                        "i2c write failed, retrying"
                    );
                    self.delay.delay_ms(self.policy.retry_delay_ms);
                }
            }
        }

        self.i2c.write(self.address, payload).map_err(|e| {
            let kind = e.kind();
            tracing::error!(
                address = self.address,
                attempts = self.policy.max_writes(),
                ?kind,
                "i2c write failed past retry budget"
            );
            BusError::Exhausted {
                address: self.address,
                attempts: self.policy.max_writes(),
                kind,
            }
        })
    }

    /// Blocks for `ms` milliseconds using the bus's delay provider.
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// 7-bit device address this bus writes to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The underlying I2C peripheral.
    pub fn i2c(&self) -> &I2C {
        &self.i2c
    }

    /// The delay provider used for retry pauses.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Gives back the owned peripherals.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockI2c};

    fn bus(i2c: MockI2c) -> RetryingBus<MockI2c, MockDelay> {
        RetryingBus::new(i2c, MockDelay::new(), 0x3C)
    }

    #[test]
    fn success_on_first_attempt() {
        let mut bus = bus(MockI2c::new());
        bus.send(&[0x00, 0xAE]).unwrap();

        let (i2c, delay) = bus.release();
        assert_eq!(i2c.attempts(), 1);
        assert_eq!(i2c.writes(), &[(0x3C, vec![0x00, 0xAE])]);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn three_failures_then_success_makes_four_attempts() {
        let mut bus = bus(MockI2c::new().fail_next(3));
        bus.send(&[0x40, 1, 2, 3]).unwrap();

        let (i2c, delay) = bus.release();
        assert_eq!(i2c.attempts(), 4);
        assert_eq!(i2c.writes().len(), 1);
        assert_eq!(delay.calls(), &[5, 5, 5]);
    }

    #[test]
    fn failure_on_every_guarded_attempt_recovers_on_final_one() {
        let mut bus = bus(MockI2c::new().fail_next(8));
        bus.send(&[0x00, 0xAF]).unwrap();

        let (i2c, delay) = bus.release();
        assert_eq!(i2c.attempts(), 9);
        assert_eq!(delay.calls().len(), 8);
    }

    #[test]
    fn persistent_failure_propagates_after_budget_plus_one() {
        let mut bus = bus(MockI2c::new().fail_always());
        let err = bus.send(&[0x00, 0xAF]).unwrap_err();

        assert_eq!(
            err,
            BusError::Exhausted {
                address: 0x3C,
                attempts: 9,
                kind: i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address),
            }
        );
        let (i2c, delay) = bus.release();
        assert_eq!(i2c.attempts(), 9);
        // No pause after the final attempt.
        assert_eq!(delay.calls().len(), 8);
        assert!(i2c.writes().is_empty());
    }

    #[test]
    fn custom_policy_bounds_attempts() {
        let policy = RetryPolicy {
            attempts: 2,
            retry_delay_ms: 1,
        };
        let mut bus = bus(MockI2c::new().fail_always()).with_policy(policy);
        let err = bus.send(&[0x00, 0xA6]).unwrap_err();

        assert!(matches!(err, BusError::Exhausted { attempts: 3, .. }));
        assert_eq!(bus.policy(), policy);
        let (i2c, delay) = bus.release();
        assert_eq!(i2c.attempts(), 3);
        assert_eq!(delay.total_ms(), 2);
    }

    #[test]
    fn zero_attempt_policy_still_tries_once() {
        let policy = RetryPolicy {
            attempts: 0,
            retry_delay_ms: 5,
        };
        let mut bus = bus(MockI2c::new()).with_policy(policy);
        bus.send(&[0x00, 0xA4]).unwrap();
        let (i2c, _) = bus.release();
        assert_eq!(i2c.attempts(), 1);
    }

    #[test]
    fn empty_payload_is_rejected_without_bus_access() {
        let mut bus = bus(MockI2c::new());
        assert_eq!(bus.send(&[]), Err(BusError::EmptyPayload));
        let (i2c, _) = bus.release();
        assert_eq!(i2c.attempts(), 0);
    }

    #[test]
    fn pause_uses_owned_delay() {
        let mut bus = bus(MockI2c::new());
        bus.pause_ms(2);
        bus.pause_ms(1);
        assert_eq!(bus.address(), 0x3C);
        let (_, delay) = bus.release();
        assert_eq!(delay.calls(), &[2, 1]);
    }

    #[test]
    fn exhausted_error_message_names_address() {
        let err = BusError::Exhausted {
            address: 0x3C,
            attempts: 9,
            kind: i2c::ErrorKind::Bus,
        };
        let msg = format!("{err}");
        assert!(msg.contains("0x3c"));
        assert!(msg.contains("9 attempts"));
    }
}
