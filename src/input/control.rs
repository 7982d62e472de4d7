use glam::Vec2;
use std::fmt::{self, Display};

/// Logical controls of the simulated rig
///
/// Physical gamepad elements are bound to these by
/// [`InputBindings`](crate::controller::bindings::InputBindings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Reset,
    LeftStick,
    RightStick,
    HeadControl,
    LeftGrip,
    RightGrip,
    LeftBumper,
    RightBumper,
    ButtonA,
    ButtonB,
    ButtonX,
    ButtonY,
    MenuButton,
    AuxButton,
}

impl Control {
    pub const ALL: [Control; 14] = [
        Control::Reset,
        Control::LeftStick,
        Control::RightStick,
        Control::HeadControl,
        Control::LeftGrip,
        Control::RightGrip,
        Control::LeftBumper,
        Control::RightBumper,
        Control::ButtonA,
        Control::ButtonB,
        Control::ButtonX,
        Control::ButtonY,
        Control::MenuButton,
        Control::AuxButton,
    ];

    /// Value kind this control accepts
    pub fn kind(self) -> ControlKind {
        match self {
            Control::LeftStick | Control::RightStick | Control::HeadControl => ControlKind::Axis2D,
            Control::LeftGrip | Control::RightGrip | Control::LeftBumper | Control::RightBumper => {
                ControlKind::Scalar
            }
            Control::Reset
            | Control::ButtonA
            | Control::ButtonB
            | Control::ButtonX
            | Control::ButtonY
            | Control::MenuButton
            | Control::AuxButton => ControlKind::Button,
        }
    }

    /// Value the control returns to when released
    pub fn rest_value(self) -> ControlValue {
        match self.kind() {
            ControlKind::Axis2D => ControlValue::Axis2D(Vec2::ZERO),
            ControlKind::Scalar => ControlValue::Scalar(0.0),
            ControlKind::Button => ControlValue::Button(false),
        }
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Axis2D,
    Scalar,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Axis2D(Vec2),
    Scalar(f32),
    Button(bool),
}

impl ControlValue {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlValue::Axis2D(_) => ControlKind::Axis2D,
            ControlValue::Scalar(_) => ControlKind::Scalar,
            ControlValue::Button(_) => ControlKind::Button,
        }
    }
}

/// A single change of a logical control
///
/// `Performed` carries the new value, `Canceled` returns the control to its
/// rest value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Performed { control: Control, value: ControlValue },
    Canceled { control: Control },
}

impl ControlEvent {
    pub fn control(&self) -> Control {
        match self {
            ControlEvent::Performed { control, .. } | ControlEvent::Canceled { control } => *control,
        }
    }

    pub fn axis(control: Control, value: Vec2) -> Self {
        ControlEvent::Performed {
            control,
            value: ControlValue::Axis2D(value),
        }
    }

    pub fn scalar(control: Control, value: f32) -> Self {
        ControlEvent::Performed {
            control,
            value: ControlValue::Scalar(value),
        }
    }

    pub fn pressed(control: Control) -> Self {
        ControlEvent::Performed {
            control,
            value: ControlValue::Button(true),
        }
    }

    pub fn canceled(control: Control) -> Self {
        ControlEvent::Canceled { control }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("Control {control} expects {expected:?} values, got {got:?}")]
    KindMismatch {
        control: Control,
        expected: ControlKind,
        got: ControlKind,
    },
}
