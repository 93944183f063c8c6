//! Button-triggered hobby servos.
//!
//! Each actuator is a button paired with a servo on a 50 Hz PWM output.
//! Position control is open loop: an angle is mapped linearly to a duty
//! value and written, with no feedback.
//!
//! # Duty mapping
//!
//! Duty values are on a 16-bit scale (`0..=65535` is `0..=100%`). The
//! reference servos use `1638` (0°) to `8192` (180°). Outputs with a
//! different resolution receive the value scaled through
//! [`SetDutyCycle::set_duty_cycle_fraction`].
//!
//! ```rust
//! use tekenrobot::servo::{angle_to_duty, ServoAngle, MAX_DUTY, MIN_DUTY};
//!
//! assert_eq!(angle_to_duty(ServoAngle::MIN), MIN_DUTY);
//! assert_eq!(angle_to_duty(ServoAngle::MAX), MAX_DUTY);
//! assert_eq!(angle_to_duty(ServoAngle::new(90).unwrap()), 4915);
//! ```

use core::iter;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, Error as _, InputPin};
use embedded_hal::pwm::{self, Error as _, SetDutyCycle};
use heapless::Vec;
use thiserror::Error;

/// Duty for 0° on the 16-bit scale.
pub const MIN_DUTY: u16 = 1638;
/// Duty for 180° on the 16-bit scale.
pub const MAX_DUTY: u16 = 8192;
/// Full travel in degrees.
pub const MAX_ANGLE: u8 = 180;
/// Most button/servo pairs an [`ActuatorSet`] holds.
pub const MAX_ACTUATORS: usize = 8;

/// Actuator errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ServoError {
    /// No pair with this id.
    #[error("no actuator with id {0}")]
    UnknownActuator(u8),

    /// Two pairs share an id.
    #[error("actuator id {0} configured twice")]
    DuplicateActuator(u8),

    /// More pairs than [`MAX_ACTUATORS`].
    #[error("too many actuators configured")]
    TooManyActuators,

    /// The PWM output rejected a duty value.
    #[error("pwm output failed: {0:?}")]
    Pwm(pwm::ErrorKind),
}

/// Servo position in whole degrees, `0..=180`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoAngle(u8);

impl ServoAngle {
    /// 0°.
    pub const MIN: Self = Self(0);
    /// 180°.
    pub const MAX: Self = Self(MAX_ANGLE);

    /// Returns `None` above 180°.
    pub const fn new(degrees: u8) -> Option<Self> {
        if degrees <= MAX_ANGLE {
            Some(Self(degrees))
        } else {
            None
        }
    }

    /// Saturates at 180°.
    pub const fn clamped(degrees: u8) -> Self {
        if degrees > MAX_ANGLE {
            Self::MAX
        } else {
            Self(degrees)
        }
    }

    /// The angle in degrees.
    pub const fn degrees(self) -> u8 {
        self.0
    }
}

/// Duty values pinned to 0° and 180°.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DutyRange {
    /// Duty at 0°.
    pub min: u16,
    /// Duty at 180°.
    pub max: u16,
}

impl DutyRange {
    /// Reference range, `1638..=8192`.
    pub const DEFAULT: Self = Self {
        min: MIN_DUTY,
        max: MAX_DUTY,
    };

    /// Returns `None` when `min > max`.
    pub const fn new(min: u16, max: u16) -> Option<Self> {
        if min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Linear map from angle to duty, rounding down.
    pub const fn duty_for(&self, angle: ServoAngle) -> u16 {
        let span = (self.max - self.min) as u32;
        let offset = angle.0 as u32 * span / MAX_ANGLE as u32;
        self.min + offset as u16
    }
}

impl Default for DutyRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Maps an angle onto the reference duty range.
pub const fn angle_to_duty(angle: ServoAngle) -> u16 {
    DutyRange::DEFAULT.duty_for(angle)
}

/// How a sweep moves: angle increment and time per increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepProfile {
    /// Degrees per step (0 is treated as 1).
    pub step_deg: u8,
    /// Hold time after each step.
    pub step_delay_ms: u32,
}

impl Default for SweepProfile {
    fn default() -> Self {
        Self {
            step_deg: 2,
            step_delay_ms: 20,
        }
    }
}

impl SweepProfile {
    /// Total blocking time of one sweep.
    pub fn duration_ms(&self) -> u32 {
        sweep_angles(self.step_deg).count() as u32 * self.step_delay_ms
    }
}

/// Angles visited by a sweep: `0, step, ..., 180` then `180, 180 - step, ..., 0`.
///
/// Both endpoints are always visited, even when `step_deg` does not divide
/// 180. With the reference step of 2° that is 91 angles each way.
pub fn sweep_angles(step_deg: u8) -> impl Iterator<Item = ServoAngle> {
    let step = usize::from(step_deg.max(1));
    let skips_end = usize::from(MAX_ANGLE) % step != 0;

    let up = (0..=MAX_ANGLE)
        .step_by(step)
        .chain(iter::once(MAX_ANGLE).filter(move |_| skips_end));
    let down = (0..=MAX_ANGLE)
        .rev()
        .step_by(step)
        .chain(iter::once(0).filter(move |_| skips_end));

    up.chain(down).map(ServoAngle)
}

/// One servo on a PWM output.
pub struct Servo<P> {
    pwm: P,
    duty: DutyRange,
    angle: Option<ServoAngle>,
}

impl<P: SetDutyCycle> Servo<P> {
    /// Wraps a PWM output. The position is unknown until the first
    /// [`set_angle`](Self::set_angle).
    pub fn new(pwm: P, duty: DutyRange) -> Self {
        Self {
            pwm,
            duty,
            angle: None,
        }
    }

    /// Writes the duty for `angle`.
    pub fn set_angle(&mut self, angle: ServoAngle) -> Result<(), ServoError> {
        let duty = self.duty.duty_for(angle);
        self.pwm
            .set_duty_cycle_fraction(duty, u16::MAX)
            .map_err(|e| ServoError::Pwm(e.kind()))?;
        self.angle = Some(angle);
        Ok(())
    }

    /// Last commanded angle.
    pub fn angle(&self) -> Option<ServoAngle> {
        self.angle
    }

    /// The PWM output.
    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

/// A button and the servo it triggers.
pub struct ButtonActuatorPair<B, P> {
    id: u8,
    button: B,
    servo: Servo<P>,
}

impl<B: InputPin, P: SetDutyCycle> ButtonActuatorPair<B, P> {
    /// Pairs `button` with a servo on `pwm`. `id` names the pair on screen.
    pub fn new(id: u8, button: B, pwm: P, duty: DutyRange) -> Self {
        Self {
            id,
            button,
            servo: Servo::new(pwm, duty),
        }
    }

    /// Identifier shown while this actuator moves.
    pub fn id(&self) -> u8 {
        self.id
    }
}

/// Fixed set of button/servo pairs, scanned in insertion order.
///
/// # Example
///
/// ```rust
/// use tekenrobot::servo::{ActuatorSet, ButtonActuatorPair, DutyRange, ServoAngle};
/// use tekenrobot::hal::{MockDelay, MockInput, MockPwm};
///
/// let mut set = ActuatorSet::new()
///     .with_pair(ButtonActuatorPair::new(13, MockInput::new(), MockPwm::new(), DutyRange::DEFAULT))
///     .unwrap();
///
/// let mut delay = MockDelay::new();
/// set.sweep(13, &mut delay).unwrap();
///
/// assert_eq!(set.servo(13).unwrap().angle(), Some(ServoAngle::MIN));
/// assert_eq!(delay.total_ms(), 182 * 20);
/// ```
pub struct ActuatorSet<B, P> {
    pairs: Vec<ButtonActuatorPair<B, P>, MAX_ACTUATORS>,
    profile: SweepProfile,
}

impl<B: InputPin, P: SetDutyCycle> ActuatorSet<B, P> {
    /// Creates an empty set with the reference [`SweepProfile`].
    pub fn new() -> Self {
        Self {
            pairs: Vec::new(),
            profile: SweepProfile::default(),
        }
    }

    /// Replaces the sweep profile.
    pub fn with_profile(mut self, profile: SweepProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Adds a pair. Ids must be unique.
    pub fn with_pair(mut self, pair: ButtonActuatorPair<B, P>) -> Result<Self, ServoError> {
        if self.index_of(pair.id).is_some() {
            return Err(ServoError::DuplicateActuator(pair.id));
        }
        self.pairs
            .push(pair)
            .map_err(|_| ServoError::TooManyActuators)?;
        Ok(self)
    }

    /// Parks every servo at 0°.
    pub fn home_all(&mut self) -> Result<(), ServoError> {
        for pair in self.pairs.iter_mut() {
            pair.servo.set_angle(ServoAngle::MIN)?;
        }
        Ok(())
    }

    /// Moves one servo.
    pub fn set_angle(&mut self, id: u8, angle: ServoAngle) -> Result<(), ServoError> {
        self.pair_mut(id)?.servo.set_angle(angle)
    }

    /// Runs a full 0° → 180° → 0° sweep on one servo.
    ///
    /// Blocks for [`SweepProfile::duration_ms`]; nothing else runs and the
    /// sweep cannot be cancelled.
    pub fn sweep<D: DelayNs>(&mut self, id: u8, delay: &mut D) -> Result<(), ServoError> {
        let profile = self.profile;
        let servo = &mut self.pair_mut(id)?.servo;

        tracing::info!(id, duration_ms = profile.duration_ms(), "sweep start");
        for angle in sweep_angles(profile.step_deg) {
            servo.set_angle(angle)?;
            delay.delay_ms(profile.step_delay_ms);
        }
        tracing::info!(id, "sweep done");
        Ok(())
    }

    /// Reads the button at `index` (scan order). Active high.
    pub fn is_pressed(&mut self, index: usize) -> Result<bool, digital::ErrorKind> {
        match self.pairs.get_mut(index) {
            Some(pair) => pair.button.is_high().map_err(|e| e.kind()),
            None => Ok(false),
        }
    }

    /// Id of the pair at `index` (scan order).
    pub fn id_at(&self, index: usize) -> Option<u8> {
        self.pairs.get(index).map(|pair| pair.id)
    }

    /// Ids in scan order.
    pub fn ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.pairs.iter().map(|pair| pair.id)
    }

    /// Scan position of `id`.
    pub fn index_of(&self, id: u8) -> Option<usize> {
        self.pairs.iter().position(|pair| pair.id == id)
    }

    /// The servo paired with `id`.
    pub fn servo(&self, id: u8) -> Option<&Servo<P>> {
        self.pairs
            .iter()
            .find(|pair| pair.id == id)
            .map(|pair| &pair.servo)
    }

    /// Current sweep profile.
    pub fn profile(&self) -> SweepProfile {
        self.profile
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs are configured.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn pair_mut(&mut self, id: u8) -> Result<&mut ButtonActuatorPair<B, P>, ServoError> {
        self.pairs
            .iter_mut()
            .find(|pair| pair.id == id)
            .ok_or(ServoError::UnknownActuator(id))
    }
}

impl<B: InputPin, P: SetDutyCycle> Default for ActuatorSet<B, P> {
    fn default() -> Self {
        Self::new()
    }
}
