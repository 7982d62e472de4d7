//! Input Aggregator - latest value per logical control
//!
//! Every write entry point is a plain field assignment: it never blocks,
//! allocates or fails, and writing the same value twice is the same as
//! writing it once. Releasing a control writes its rest value.

use glam::Vec2;
use tracing::{debug, error};

use super::control::{Control, ControlEvent, ControlValue, InputError};

/// Current value of every logical control
///
/// `Default` is the rest state: zero vectors, zero scalars, released buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSample {
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub head_control: Vec2,

    pub left_grip: f32,
    pub right_grip: f32,
    pub left_bumper: f32,
    pub right_bumper: f32,

    pub button_a: bool,
    pub button_b: bool,
    pub button_x: bool,
    pub button_y: bool,
    pub menu_button: bool,
    pub aux_button: bool,

    pub reset_requested: bool,
}

/// Holds the [`InputSample`] and exposes one typed port per control
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    sample: InputSample,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current values, read once per tick
    pub fn snapshot(&self) -> InputSample {
        self.sample
    }

    pub fn sample(&self) -> &InputSample {
        &self.sample
    }

    /// Returns every control to its rest value
    pub fn clear(&mut self) {
        debug!("Clearing all held control values");
        self.sample = InputSample::default();
    }

    pub fn set_left_stick(&mut self, value: Vec2) {
        self.sample.left_stick = value;
    }

    pub fn set_right_stick(&mut self, value: Vec2) {
        self.sample.right_stick = value;
    }

    pub fn set_head_control(&mut self, value: Vec2) {
        self.sample.head_control = value;
    }

    pub fn set_left_grip(&mut self, value: f32) {
        self.sample.left_grip = value;
    }

    pub fn set_right_grip(&mut self, value: f32) {
        self.sample.right_grip = value;
    }

    pub fn set_left_bumper(&mut self, value: f32) {
        self.sample.left_bumper = value;
    }

    pub fn set_right_bumper(&mut self, value: f32) {
        self.sample.right_bumper = value;
    }

    pub fn set_button_a(&mut self, pressed: bool) {
        self.sample.button_a = pressed;
    }

    pub fn set_button_b(&mut self, pressed: bool) {
        self.sample.button_b = pressed;
    }

    pub fn set_button_x(&mut self, pressed: bool) {
        self.sample.button_x = pressed;
    }

    pub fn set_button_y(&mut self, pressed: bool) {
        self.sample.button_y = pressed;
    }

    pub fn set_menu_button(&mut self, pressed: bool) {
        self.sample.menu_button = pressed;
    }

    pub fn set_aux_button(&mut self, pressed: bool) {
        self.sample.aux_button = pressed;
    }

    pub fn set_reset(&mut self, requested: bool) {
        self.sample.reset_requested = requested;
    }

    /// Routes an event to the matching port
    ///
    /// A value whose kind does not fit the control is a wiring bug in the
    /// event source. It is rejected and the sample stays untouched.
    pub fn apply(&mut self, event: ControlEvent) -> Result<(), InputError> {
        let (control, value) = match event {
            ControlEvent::Performed { control, value } => (control, value),
            ControlEvent::Canceled { control } => (control, control.rest_value()),
        };

        if value.kind() != control.kind() {
            error!(
                "Rejecting {:?} value for control {} (expects {:?})",
                value.kind(),
                control,
                control.kind()
            );
            debug_assert!(false, "control kind mismatch for {control}");
            return Err(InputError::KindMismatch {
                control,
                expected: control.kind(),
                got: value.kind(),
            });
        }

        debug!("Applying {:?} to {}", value, control);

        match (control, value) {
            (Control::LeftStick, ControlValue::Axis2D(v)) => self.set_left_stick(v),
            (Control::RightStick, ControlValue::Axis2D(v)) => self.set_right_stick(v),
            (Control::HeadControl, ControlValue::Axis2D(v)) => self.set_head_control(v),
            (Control::LeftGrip, ControlValue::Scalar(v)) => self.set_left_grip(v),
            (Control::RightGrip, ControlValue::Scalar(v)) => self.set_right_grip(v),
            (Control::LeftBumper, ControlValue::Scalar(v)) => self.set_left_bumper(v),
            (Control::RightBumper, ControlValue::Scalar(v)) => self.set_right_bumper(v),
            (Control::ButtonA, ControlValue::Button(b)) => self.set_button_a(b),
            (Control::ButtonB, ControlValue::Button(b)) => self.set_button_b(b),
            (Control::ButtonX, ControlValue::Button(b)) => self.set_button_x(b),
            (Control::ButtonY, ControlValue::Button(b)) => self.set_button_y(b),
            (Control::MenuButton, ControlValue::Button(b)) => self.set_menu_button(b),
            (Control::AuxButton, ControlValue::Button(b)) => self.set_aux_button(b),
            (Control::Reset, ControlValue::Button(b)) => self.set_reset(b),
            // kinds were checked above
            _ => unreachable!("kind-checked control {control} fell through"),
        }

        Ok(())
    }
}
