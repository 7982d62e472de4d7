//! Fixed layout from physical gamepad elements to logical controls
//!
//! The translator keeps the little state needed to turn per-axis and
//! per-direction gilrs events into whole control values: the last X/Y of
//! each stick and which D-pad directions are held.
//!
//! | Logical control | gilrs element                         |
//! |-----------------|---------------------------------------|
//! | Left stick      | `LeftStickX` / `LeftStickY`           |
//! | Right stick     | `RightStickX` / `RightStickY`         |
//! | Head control    | D-pad buttons, `DPadX` / `DPadY` axes |
//! | Left grip       | `LeftTrigger2` (analog)               |
//! | Right grip      | `RightTrigger2` (analog)              |
//! | Left bumper     | `LeftTrigger`                         |
//! | Right bumper    | `RightTrigger`                        |
//! | A / B / X / Y   | `South` / `East` / `West` / `North`   |
//! | Aux button      | `Select`                              |
//! | Menu button     | `Start`                               |

use gilrs::{Axis, Button};
use glam::Vec2;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::input::{Control, ControlEvent, ControlKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisComponent {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DpadDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Default)]
struct DpadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl DpadState {
    fn set(&mut self, direction: DpadDirection, pressed: bool) {
        match direction {
            DpadDirection::Up => self.up = pressed,
            DpadDirection::Down => self.down = pressed,
            DpadDirection::Left => self.left = pressed,
            DpadDirection::Right => self.right = pressed,
        }
    }

    fn vector(&self) -> Vec2 {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (false, true) => 1.0,
            (true, false) => -1.0,
            _ => 0.0,
        };
        Vec2::new(axis(self.left, self.right), axis(self.down, self.up))
    }
}

/// Turns gilrs axis/button changes into [`ControlEvent`]s
#[derive(Debug, Clone)]
pub struct InputBindings {
    axes: HashMap<Axis, (Control, AxisComponent)>,
    buttons: HashMap<Button, Control>,
    dpad: HashMap<Button, DpadDirection>,
    held_axes: HashMap<Control, Vec2>,
    // Button and scalar controls currently away from rest
    held_controls: HashSet<Control>,
    dpad_state: DpadState,
}

impl InputBindings {
    pub fn default_layout() -> Self {
        let axes = HashMap::from([
            (Axis::LeftStickX, (Control::LeftStick, AxisComponent::X)),
            (Axis::LeftStickY, (Control::LeftStick, AxisComponent::Y)),
            (Axis::RightStickX, (Control::RightStick, AxisComponent::X)),
            (Axis::RightStickY, (Control::RightStick, AxisComponent::Y)),
            (Axis::DPadX, (Control::HeadControl, AxisComponent::X)),
            (Axis::DPadY, (Control::HeadControl, AxisComponent::Y)),
        ]);

        let buttons = HashMap::from([
            (Button::LeftTrigger2, Control::LeftGrip),
            (Button::RightTrigger2, Control::RightGrip),
            (Button::LeftTrigger, Control::LeftBumper),
            (Button::RightTrigger, Control::RightBumper),
            (Button::South, Control::ButtonA),
            (Button::East, Control::ButtonB),
            (Button::West, Control::ButtonX),
            (Button::North, Control::ButtonY),
            (Button::Select, Control::AuxButton),
            (Button::Start, Control::MenuButton),
        ]);

        let dpad = HashMap::from([
            (Button::DPadUp, DpadDirection::Up),
            (Button::DPadDown, DpadDirection::Down),
            (Button::DPadLeft, DpadDirection::Left),
            (Button::DPadRight, DpadDirection::Right),
        ]);

        Self {
            axes,
            buttons,
            dpad,
            held_axes: HashMap::new(),
            held_controls: HashSet::new(),
            dpad_state: DpadState::default(),
        }
    }

    /// Optional extra gamepad button that requests a reset while held
    pub fn with_reset_button(mut self, button: Button) -> Self {
        self.buttons.insert(button, Control::Reset);
        self
    }

    pub fn control_for_button(&self, button: Button) -> Option<Control> {
        self.buttons.get(&button).copied()
    }

    pub fn control_for_axis(&self, axis: Axis) -> Option<(Control, AxisComponent)> {
        self.axes.get(&axis).copied()
    }

    /// Drops all held state, e.g. after a disconnect
    ///
    /// Returns cancel events for every stick, D-pad, button and scalar
    /// control that was away from rest.
    pub fn release_all(&mut self) -> Vec<ControlEvent> {
        let mut events: Vec<ControlEvent> = self
            .held_axes
            .drain()
            .filter(|(_, value)| *value != Vec2::ZERO)
            .map(|(control, _)| ControlEvent::canceled(control))
            .collect();

        if self.dpad_state.vector() != Vec2::ZERO {
            events.push(ControlEvent::canceled(Control::HeadControl));
        }
        self.dpad_state = DpadState::default();

        events.extend(self.held_controls.drain().map(ControlEvent::canceled));
        events
    }

    /// One component of a 2D control moved
    pub fn translate_axis(&mut self, axis: Axis, value: f32) -> Option<ControlEvent> {
        let (control, component) = self.control_for_axis(axis)?;

        let held = self.held_axes.entry(control).or_insert(Vec2::ZERO);
        match component {
            AxisComponent::X => held.x = value,
            AxisComponent::Y => held.y = value,
        }
        let vector = *held;

        debug!("{:?} -> {} = {}", axis, control, vector);
        Some(Self::axis_event(control, vector))
    }

    /// Analog value of a button changed; only scalar controls listen here
    pub fn translate_button_value(&mut self, button: Button, value: f32) -> Option<ControlEvent> {
        let control = self.control_for_button(button)?;
        if control.kind() != ControlKind::Scalar {
            return None;
        }

        if value > 0.0 {
            self.held_controls.insert(control);
            Some(ControlEvent::scalar(control, value))
        } else {
            self.held_controls.remove(&control);
            Some(ControlEvent::canceled(control))
        }
    }

    /// Digital press or release
    pub fn translate_button(&mut self, button: Button, pressed: bool) -> Option<ControlEvent> {
        if let Some(direction) = self.dpad.get(&button).copied() {
            self.dpad_state.set(direction, pressed);
            return Some(Self::axis_event(Control::HeadControl, self.dpad_state.vector()));
        }

        let control = self.control_for_button(button)?;
        if control.kind() != ControlKind::Button {
            // scalar controls are fed by translate_button_value
            return None;
        }

        if pressed {
            self.held_controls.insert(control);
            Some(ControlEvent::pressed(control))
        } else {
            self.held_controls.remove(&control);
            Some(ControlEvent::canceled(control))
        }
    }

    fn axis_event(control: Control, vector: Vec2) -> ControlEvent {
        if vector == Vec2::ZERO {
            ControlEvent::canceled(control)
        } else {
            ControlEvent::axis(control, vector)
        }
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::default_layout()
    }
}
