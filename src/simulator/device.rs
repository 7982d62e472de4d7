use glam::{Quat, Vec2, Vec3};
use std::fmt::{self, Display};

/// The three simulated tracked devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Hmd,
    LeftController,
    RightController,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [
        DeviceKind::Hmd,
        DeviceKind::LeftController,
        DeviceKind::RightController,
    ];

    pub fn is_controller(self) -> bool {
        !matches!(self, DeviceKind::Hmd)
    }
}

impl Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Hmd => write!(f, "HMD"),
            DeviceKind::LeftController => write!(f, "Left Controller"),
            DeviceKind::RightController => write!(f, "Right Controller"),
        }
    }
}

/// Tracking flags reported with every device record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingState {
    pub is_tracked: bool,
    pub position_tracked: bool,
    pub rotation_tracked: bool,
}

impl TrackingState {
    pub const FULL: Self = Self {
        is_tracked: true,
        position_tracked: true,
        rotation_tracked: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerButtons {
    pub primary: bool,
    pub secondary: bool,
    pub menu: bool,
}

/// Control values carried by the hand controllers only
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerControls {
    pub grip: f32,
    pub trigger: f32,
    pub axis_2d: Vec2,
    pub buttons: ControllerButtons,
}

/// Record pushed to the device sink once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    pub kind: DeviceKind,
    pub tracking: TrackingState,
    pub position: Vec3,
    pub rotation: Quat,
    /// `Some` for controllers, `None` for the HMD
    pub controls: Option<ControllerControls>,
}

impl DeviceState {
    pub fn new(kind: DeviceKind, position: Vec3) -> Self {
        Self {
            kind,
            tracking: TrackingState::default(),
            position,
            rotation: Quat::IDENTITY,
            controls: kind.is_controller().then(ControllerControls::default),
        }
    }
}

/// One value per simulated device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerDevice<T> {
    pub hmd: T,
    pub left: T,
    pub right: T,
}

impl<T> PerDevice<T> {
    pub fn get(&self, kind: DeviceKind) -> &T {
        match kind {
            DeviceKind::Hmd => &self.hmd,
            DeviceKind::LeftController => &self.left,
            DeviceKind::RightController => &self.right,
        }
    }

    pub fn get_mut(&mut self, kind: DeviceKind) -> &mut T {
        match kind {
            DeviceKind::Hmd => &mut self.hmd,
            DeviceKind::LeftController => &mut self.left,
            DeviceKind::RightController => &mut self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceKind, &T)> {
        DeviceKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}
