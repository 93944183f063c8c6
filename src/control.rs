//! The station's single-threaded control loop.
//!
//! One iteration ([`ControlLoop::tick`]) does, in order:
//!
//! 1. **Blink**: once more than `blink_interval_ms` has passed since the
//!    last toggle, toggle the LEDs and the indicator, and redraw the ready
//!    screen.
//! 2. **Scan**: read the buttons in configured order. The first pressed one
//!    gets the active screen and a full blocking sweep of its servo, then
//!    the post-move ready screen. The loop then waits for that button to be
//!    released before scanning the remaining buttons.
//! 3. **Idle**: sleep `idle_sleep_ms`.
//!
//! The release wait is a state ([`LoopState::AwaitingRelease`]) rather than
//! a nested loop, so each call to `tick` returns after one poll. Blinking
//! pauses while the wait lasts.
//!
//! # Example
//!
//! ```rust
//! use tekenrobot::control::{ControlLoop, LoopState};
//! use tekenrobot::hal::{MockClock, MockDelay, MockDisplay, MockInput, MockLed, MockPwm};
//! use tekenrobot::servo::{ActuatorSet, ButtonActuatorPair, DutyRange};
//!
//! let button = MockInput::new();
//! let actuators = ActuatorSet::new()
//!     .with_pair(ButtonActuatorPair::new(13, button.clone(), MockPwm::new(), DutyRange::DEFAULT))
//!     .unwrap();
//!
//! let clock = MockClock::new();
//! let mut station = ControlLoop::new(
//!     MockDisplay::new(),
//!     actuators,
//!     (MockLed::new(), MockLed::new()),
//!     clock.clone(),
//!     MockDelay::with_clock(clock),
//! );
//!
//! station.start().unwrap();
//! button.press();
//! station.tick().unwrap();
//! assert_eq!(station.state(), LoopState::AwaitingRelease { index: 0 });
//!
//! button.release();
//! station.tick().unwrap();
//! assert_eq!(station.state(), LoopState::Scanning);
//! ```

use core::convert::Infallible;
use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin};
use embedded_hal::pwm::SetDutyCycle;
use thiserror::Error;

use crate::config::{Config, LoopConfig, TextConfig};
use crate::render::Screen;
use crate::servo::{ActuatorSet, ServoError};
use crate::traits::{Clock, StatusDisplay, StatusLeds};

/// Anything that stops the control loop.
#[derive(Debug, Error)]
pub enum LoopError<E: Debug> {
    /// Rendering or flushing the status screen failed.
    #[error("display failed: {0:?}")]
    Display(E),

    /// A servo rejected a position.
    #[error(transparent)]
    Actuator(#[from] ServoError),

    /// A button could not be read.
    #[error("button read failed: {0:?}")]
    Input(digital::ErrorKind),

    /// A status LED could not be toggled.
    #[error("status led failed: {0:?}")]
    Led(digital::ErrorKind),
}

/// Where the loop is between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Normal operation: blink, then scan from the first button.
    Scanning,
    /// A sweep finished; polling the button at `index` until it is released.
    AwaitingRelease {
        /// Scan position of the button being waited on.
        index: usize,
    },
}

/// Owns every peripheral and runs the station.
pub struct ControlLoop<Disp, B, P, L, C, D> {
    display: Disp,
    actuators: ActuatorSet<B, P>,
    leds: L,
    clock: C,
    delay: D,
    config: LoopConfig,
    texts: TextConfig,
    state: LoopState,
    indicator_on: bool,
    last_blink_ms: u64,
}

impl<Disp, B, P, L, C, D> ControlLoop<Disp, B, P, L, C, D>
where
    Disp: StatusDisplay,
    B: InputPin,
    P: SetDutyCycle,
    L: StatusLeds,
    C: Clock,
    D: DelayNs,
{
    /// Creates a loop with the reference timing and texts.
    pub fn new(display: Disp, actuators: ActuatorSet<B, P>, leds: L, clock: C, delay: D) -> Self {
        Self {
            display,
            actuators,
            leds,
            clock,
            delay,
            config: LoopConfig::default(),
            texts: TextConfig::default(),
            state: LoopState::Scanning,
            indicator_on: false,
            last_blink_ms: 0,
        }
    }

    /// Set loop timing
    pub fn with_loop_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Set screen texts
    pub fn with_texts(mut self, texts: TextConfig) -> Self {
        self.texts = texts;
        self
    }

    /// Applies the timing, texts and sweep profile of a station config.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.actuators = self.actuators.with_profile(config.servo.sweep);
        self.with_loop_config(config.control.clone())
            .with_texts(config.texts.clone())
    }

    /// Parks the servos, draws the ready screen and starts the blink timer.
    pub fn start(&mut self) -> Result<(), LoopError<Disp::Error>> {
        self.actuators.home_all()?;
        self.show(&Screen::ready(&self.texts))?;
        self.last_blink_ms = self.clock.now_ms();
        self.state = LoopState::Scanning;
        tracing::info!(actuators = self.actuators.len(), "control loop started");
        Ok(())
    }

    /// Runs one loop iteration.
    pub fn tick(&mut self) -> Result<(), LoopError<Disp::Error>> {
        let first = match self.state {
            LoopState::AwaitingRelease { index } => {
                if self.actuators.is_pressed(index).map_err(LoopError::Input)? {
                    self.delay.delay_ms(self.config.release_poll_ms);
                    return Ok(());
                }
                tracing::info!(id = ?self.actuators.id_at(index), "button released");
                self.state = LoopState::Scanning;
                index + 1
            }
            LoopState::Scanning => {
                self.service_blink()?;
                0
            }
        };

        for index in first..self.actuators.len() {
            if !self.actuators.is_pressed(index).map_err(LoopError::Input)? {
                continue;
            }
            let Some(id) = self.actuators.id_at(index) else {
                continue;
            };
            tracing::info!(id, "button pressed");
            self.actuate(id)?;
            self.state = LoopState::AwaitingRelease { index };
            return Ok(());
        }

        self.delay.delay_ms(self.config.idle_sleep_ms);
        Ok(())
    }

    /// Calls [`start`](Self::start), then ticks until something fails.
    pub fn run(&mut self) -> Result<Infallible, LoopError<Disp::Error>> {
        self.start()?;
        loop {
            self.tick()?;
        }
    }

    fn service_blink(&mut self) -> Result<(), LoopError<Disp::Error>> {
        let now = self.clock.now_ms();
        if now.wrapping_sub(self.last_blink_ms) <= self.config.blink_interval_ms {
            return Ok(());
        }

        self.leds.toggle_all().map_err(LoopError::Led)?;
        self.indicator_on = !self.indicator_on;
        self.last_blink_ms = now;
        tracing::trace!(indicator_on = self.indicator_on, now, "blink");

        self.show(&Screen::ready(&self.texts))
    }

    fn actuate(&mut self, id: u8) -> Result<(), LoopError<Disp::Error>> {
        self.show(&Screen::actuator_active(&self.texts, id))?;
        self.actuators.sweep(id, &mut self.delay)?;
        self.show(&Screen::ready_after_move(&self.texts))
    }

    fn show(&mut self, screen: &Screen) -> Result<(), LoopError<Disp::Error>> {
        self.display
            .show(screen, self.indicator_on)
            .map_err(LoopError::Display)
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the blink indicator is lit.
    pub fn indicator_on(&self) -> bool {
        self.indicator_on
    }

    /// Time of the last blink (or of `start`).
    pub fn last_blink_ms(&self) -> u64 {
        self.last_blink_ms
    }

    /// Loop timing.
    pub fn loop_config(&self) -> &LoopConfig {
        &self.config
    }

    /// The status display.
    pub fn display(&self) -> &Disp {
        &self.display
    }

    /// The button/servo pairs.
    pub fn actuators(&self) -> &ActuatorSet<B, P> {
        &self.actuators
    }

    /// The status LEDs.
    pub fn leds(&self) -> &L {
        &self.leds
    }

    /// The delay provider.
    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockClock, MockDelay, MockDisplay, MockDisplayError, MockInput, MockLed, MockPwm};
    use crate::servo::{ButtonActuatorPair, DutyRange, SweepProfile};

    type TestLoop = ControlLoop<MockDisplay, MockInput, MockPwm, (MockLed, MockLed), MockClock, MockDelay>;

    struct Rig {
        station: TestLoop,
        buttons: [MockInput; 3],
        clock: MockClock,
    }

    fn rig_with(display: MockDisplay) -> Rig {
        let buttons = [MockInput::new(), MockInput::new(), MockInput::new()];
        let mut actuators = ActuatorSet::new();
        for (id, button) in [13, 14, 15].into_iter().zip(buttons.iter()) {
            actuators = actuators
                .with_pair(ButtonActuatorPair::new(id, button.clone(), MockPwm::new(), DutyRange::DEFAULT))
                .unwrap();
        }
        let clock = MockClock::new();
        let station = ControlLoop::new(
            display,
            actuators,
            (MockLed::new(), MockLed::new()),
            clock.clone(),
            MockDelay::with_clock(clock.clone()),
        );
        Rig {
            station,
            buttons,
            clock,
        }
    }

    fn rig() -> Rig {
        rig_with(MockDisplay::new())
    }

    fn lines(entry: &(Screen, bool)) -> [&str; 3] {
        entry.0.lines()
    }

    #[test]
    fn start_homes_servos_and_draws_ready() {
        let mut rig = rig();
        rig.clock.set(1_000);
        rig.station.start().unwrap();

        let shown = &rig.station.display().shown;
        assert_eq!(shown.len(), 1);
        assert_eq!(lines(&shown[0]), ["VPC Tekenrobot", "Gereed", "Druk knop"]);
        assert!(!shown[0].1);
        assert_eq!(rig.station.last_blink_ms(), 1_000);
        for id in [13, 14, 15] {
            assert_eq!(rig.station.actuators().servo(id).unwrap().pwm().history(), &[1638]);
        }
    }

    #[test]
    fn idle_tick_only_sleeps() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.station.tick().unwrap();

        assert_eq!(rig.station.display().render_count(), 1);
        assert_eq!(rig.station.delay().calls(), &[5]);
        assert_eq!(rig.station.state(), LoopState::Scanning);
    }

    #[test]
    fn blink_needs_strictly_more_than_interval() {
        let mut rig = rig();
        rig.station.start().unwrap();

        rig.clock.set(300);
        rig.station.tick().unwrap();
        // 300 + 5 ms idle sleep
        assert!(!rig.station.indicator_on());

        rig.station.tick().unwrap();
        assert!(rig.station.indicator_on());
        assert_eq!(rig.station.last_blink_ms(), 305);
    }

    #[test]
    fn blink_toggles_leds_and_redraws() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.clock.set(301);
        rig.station.tick().unwrap();

        let (a, b) = rig.station.leds();
        assert!(a.is_on() && b.is_on());
        let last = rig.station.display().last().unwrap();
        assert_eq!(lines(last), ["VPC Tekenrobot", "Gereed", "Druk knop"]);
        assert!(last.1);

        rig.clock.set(700);
        rig.station.tick().unwrap();
        let (a, b) = rig.station.leds();
        assert!(!a.is_on() && !b.is_on());
        assert_eq!(a.toggle_count(), 2);
        assert!(!rig.station.display().last().unwrap().1);
    }

    #[test]
    fn blink_survives_clock_wrap() {
        let mut rig = rig();
        rig.clock.set(u64::MAX - 100);
        rig.station.start().unwrap();

        rig.clock.advance(350);
        assert!(rig.clock.now_ms() < 300);
        rig.station.tick().unwrap();
        assert!(rig.station.indicator_on());
    }

    #[test]
    fn press_sweeps_and_awaits_release() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.buttons[1].press();
        rig.station.tick().unwrap();

        assert_eq!(rig.station.state(), LoopState::AwaitingRelease { index: 1 });
        let shown = &rig.station.display().shown;
        assert_eq!(lines(&shown[1]), ["Servo actief", "GPIO 14", ""]);
        assert_eq!(lines(&shown[2]), ["VPC Tekenrobot", "Gereed", ""]);

        let actuators = rig.station.actuators();
        assert_eq!(actuators.servo(14).unwrap().pwm().history().len(), 1 + 182);
        assert_eq!(actuators.servo(13).unwrap().pwm().history().len(), 1);
        assert_eq!(actuators.servo(15).unwrap().pwm().history().len(), 1);
    }

    #[test]
    fn held_button_polls_without_blinking() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.buttons[0].press();
        rig.station.tick().unwrap();
        let renders = rig.station.display().render_count();

        // The sweep alone took far longer than the blink interval.
        assert!(rig.clock.now_ms() > 3_000);
        for _ in 0..5 {
            rig.station.tick().unwrap();
        }

        assert_eq!(rig.station.display().render_count(), renders);
        assert_eq!(rig.station.leds().0.toggle_count(), 0);
        assert_eq!(&rig.station.delay().calls()[182..], &[10, 10, 10, 10, 10]);
        assert_eq!(rig.station.state(), LoopState::AwaitingRelease { index: 0 });
    }

    #[test]
    fn release_resumes_scan_at_next_button() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.buttons[0].press();
        rig.buttons[2].press();
        rig.station.tick().unwrap();
        assert_eq!(rig.station.state(), LoopState::AwaitingRelease { index: 0 });

        // Button 13 is released while 15 is still held: 15 runs in the same tick.
        rig.buttons[0].release();
        rig.station.tick().unwrap();
        assert_eq!(rig.station.state(), LoopState::AwaitingRelease { index: 2 });

        let shown = &rig.station.display().shown;
        assert_eq!(lines(&shown[3]), ["Servo actief", "GPIO 15", ""]);
        assert_eq!(shown.len(), 5);
    }

    #[test]
    fn release_of_last_button_ends_with_idle_sleep() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.buttons[2].press();
        rig.station.tick().unwrap();
        rig.buttons[2].release();
        rig.station.tick().unwrap();

        assert_eq!(rig.station.state(), LoopState::Scanning);
        assert_eq!(rig.station.delay().calls().last(), Some(&5));
        assert_eq!(rig.station.display().render_count(), 3);
    }

    #[test]
    fn first_pressed_button_wins() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.buttons[1].press();
        rig.buttons[2].press();
        rig.station.tick().unwrap();
        assert_eq!(rig.station.state(), LoopState::AwaitingRelease { index: 1 });
        assert_eq!(
            rig.station.actuators().servo(15).unwrap().pwm().history().len(),
            1
        );
    }

    #[test]
    fn active_screen_keeps_indicator_state() {
        let mut rig = rig();
        rig.station.start().unwrap();
        rig.clock.set(400);
        rig.station.tick().unwrap();
        assert!(rig.station.indicator_on());

        rig.buttons[0].press();
        rig.station.tick().unwrap();
        let shown = &rig.station.display().shown;
        assert!(shown[shown.len() - 2].1);
        assert!(shown[shown.len() - 1].1);
    }

    #[test]
    fn config_changes_timing_and_texts() {
        let config = Config::default()
            .with_control(
                LoopConfig::default()
                    .with_blink_interval_ms(50)
                    .with_idle_sleep_ms(1),
            )
            .with_texts(TextConfig::default().with_actuator_label("Knop"))
            .with_servo(crate::config::ServoConfig::default().with_sweep(SweepProfile {
                step_deg: 90,
                step_delay_ms: 1,
            }));
        let Rig {
            station,
            buttons,
            clock,
        } = rig();
        let mut station = station.with_config(&config);

        station.start().unwrap();
        clock.set(51);
        station.tick().unwrap();
        assert!(station.indicator_on());
        assert_eq!(station.delay().calls().last(), Some(&1));

        buttons[0].press();
        station.tick().unwrap();
        let shown = &station.display().shown;
        assert_eq!(lines(&shown[2]), ["Servo actief", "Knop 13", ""]);
        assert_eq!(station.actuators().servo(13).unwrap().pwm().history().len(), 1 + 6);
    }

    #[test]
    fn display_failure_stops_run() {
        let mut rig = rig_with(MockDisplay::new().fail_after(1));
        rig.buttons[0].press();
        let err = rig.station.run().unwrap_err();
        assert!(matches!(err, LoopError::Display(MockDisplayError)));
    }

    #[test]
    fn led_failure_is_reported() {
        let clock = MockClock::new();
        let mut station = ControlLoop::new(
            MockDisplay::new(),
            ActuatorSet::<MockInput, MockPwm>::new(),
            (MockLed::failing(), MockLed::new()),
            clock.clone(),
            MockDelay::new(),
        );
        station.start().unwrap();
        clock.set(1_000);
        assert!(matches!(
            station.tick(),
            Err(LoopError::Led(digital::ErrorKind::Other))
        ));
    }

    #[test]
    fn input_failure_is_reported() {
        let actuators = ActuatorSet::new()
            .with_pair(ButtonActuatorPair::new(13, MockInput::failing(), MockPwm::new(), DutyRange::DEFAULT))
            .unwrap();
        let mut station = ControlLoop::new(
            MockDisplay::new(),
            actuators,
            (),
            MockClock::new(),
            MockDelay::new(),
        );
        station.start().unwrap();
        assert!(matches!(
            station.tick(),
            Err(LoopError::Input(digital::ErrorKind::Other))
        ));
    }
}
