//! Pose/State Updater - the per-tick step
//!
//! Runs once per tick against an [`InputSample`] snapshot:
//!
//! 1. mark all devices fully tracked
//! 2. reset all orientations if requested (no integration on that tick)
//! 3. otherwise integrate stick deltas into the Euler accumulators
//! 4. copy grip/trigger/axis/buttons into the controller records
//!
//! Pushing the records to a sink is left to the caller so a tick is only
//! ever published as a whole.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::device::{
    ControllerButtons, ControllerControls, DeviceKind, DeviceState, PerDevice, TrackingState,
};
use super::orientation::EulerAccumulator;
use super::reference::ReferencePose;
use crate::input::InputSample;

/// Frame the accumulated rotations are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationSpace {
    /// Rotation is the accumulator alone
    #[default]
    Local,
    /// Rotation is the reference rotation followed by the accumulator
    Reference,
}

impl RotationSpace {
    pub fn requires_reference(self) -> bool {
        matches!(self, RotationSpace::Reference)
    }
}

/// Linear stick-to-degrees scaling for one target (head or hands)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub x: f32,
    pub y: f32,
    pub invert_y: bool,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            invert_y: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterSettings {
    pub head: Sensitivity,
    pub hand: Sensitivity,
    /// Distance between the two controllers along X
    pub hand_separation: f32,
    /// Origin used when no reference pose is available at initialization
    pub origin: Vec3,
    pub rotation_space: RotationSpace,
    /// Also move the devices back to their initial positions on reset
    pub reset_restores_position: bool,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            head: Sensitivity::default(),
            hand: Sensitivity::default(),
            hand_separation: 0.3,
            origin: Vec3::ZERO,
            rotation_space: RotationSpace::Local,
            reset_restores_position: false,
        }
    }
}

/// Orientation state for the tick that just ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationPhase {
    #[default]
    Accumulating,
    /// Reset fired this tick; back to `Accumulating` on the next one
    ResetApplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Integrated,
    Reset,
    /// Reference pose was missing, orientations kept as they were
    PoseSkipped,
}

/// Per-tick delta in degrees: `(pitch, yaw, roll)`
///
/// Pitch follows the vertical stick axis and is negated unless `invert_y`
/// is set. Yaw follows the horizontal axis. Roll is never driven.
pub fn angular_delta(stick: Vec2, sensitivity: &Sensitivity) -> Vec3 {
    let sign = if sensitivity.invert_y { 1.0 } else { -1.0 };
    Vec3::new(stick.y * sensitivity.y * sign, stick.x * sensitivity.x, 0.0)
}

/// HMD at the origin, controllers half the separation to either side
pub fn initial_positions(origin: Vec3, hand_separation: f32) -> PerDevice<Vec3> {
    let offset = Vec3::new(hand_separation / 2.0, 0.0, 0.0);
    PerDevice {
        hmd: origin,
        left: origin - offset,
        right: origin + offset,
    }
}

#[derive(Debug, Clone)]
pub struct PoseUpdater {
    settings: UpdaterSettings,
    orientations: PerDevice<EulerAccumulator>,
    states: PerDevice<DeviceState>,
    initial_positions: PerDevice<Vec3>,
    phase: OrientationPhase,
}

impl PoseUpdater {
    pub fn new(settings: UpdaterSettings) -> Self {
        let initial_positions = initial_positions(settings.origin, settings.hand_separation);
        let states = PerDevice {
            hmd: DeviceState::new(DeviceKind::Hmd, initial_positions.hmd),
            left: DeviceState::new(DeviceKind::LeftController, initial_positions.left),
            right: DeviceState::new(DeviceKind::RightController, initial_positions.right),
        };

        Self {
            settings,
            orientations: PerDevice::default(),
            states,
            initial_positions,
            phase: OrientationPhase::Accumulating,
        }
    }

    /// Places the devices around the origin and runs a reset pass
    ///
    /// The reference position is the origin when available, the configured
    /// origin otherwise.
    pub fn initialize(&mut self, reference: Option<ReferencePose>) {
        let origin = match reference {
            Some(pose) => pose.position,
            None => {
                warn!(
                    "No reference pose at initialization, using configured origin {}",
                    self.settings.origin
                );
                self.settings.origin
            }
        };

        self.initial_positions = initial_positions(origin, self.settings.hand_separation);
        for kind in DeviceKind::ALL {
            self.states.get_mut(kind).position = *self.initial_positions.get(kind);
        }

        self.assign_tracking();
        let frame = self.frame_rotation(reference).unwrap_or(Quat::IDENTITY);
        self.orientations = PerDevice::default();
        self.refresh_rotations(frame);
        self.phase = OrientationPhase::Accumulating;

        info!(
            "Initialized devices: HMD {} / left {} / right {}",
            self.initial_positions.hmd, self.initial_positions.left, self.initial_positions.right
        );
    }

    pub fn tick(&mut self, input: &InputSample, reference: Option<ReferencePose>) -> TickOutcome {
        self.assign_tracking();

        let outcome = match self.frame_rotation(reference) {
            None => {
                warn!("Reference pose missing, skipping pose update for this tick");
                self.phase = OrientationPhase::Accumulating;
                TickOutcome::PoseSkipped
            }
            Some(frame) if input.reset_requested => {
                self.apply_reset(frame);
                self.phase = OrientationPhase::ResetApplied;
                TickOutcome::Reset
            }
            Some(frame) => {
                self.integrate(input, frame);
                self.phase = OrientationPhase::Accumulating;
                TickOutcome::Integrated
            }
        };

        self.map_controls(input);
        outcome
    }

    pub fn settings(&self) -> &UpdaterSettings {
        &self.settings
    }

    pub fn phase(&self) -> OrientationPhase {
        self.phase
    }

    pub fn orientation(&self, kind: DeviceKind) -> &EulerAccumulator {
        self.orientations.get(kind)
    }

    pub fn state(&self, kind: DeviceKind) -> &DeviceState {
        self.states.get(kind)
    }

    pub fn states(&self) -> &PerDevice<DeviceState> {
        &self.states
    }

    pub fn initial_position(&self, kind: DeviceKind) -> Vec3 {
        *self.initial_positions.get(kind)
    }

    fn frame_rotation(&self, reference: Option<ReferencePose>) -> Option<Quat> {
        match self.settings.rotation_space {
            RotationSpace::Local => Some(Quat::IDENTITY),
            RotationSpace::Reference => reference.map(|pose| pose.rotation),
        }
    }

    fn assign_tracking(&mut self) {
        for kind in DeviceKind::ALL {
            self.states.get_mut(kind).tracking = TrackingState::FULL;
        }
    }

    fn apply_reset(&mut self, frame: Quat) {
        info!("Resetting device orientations");
        for kind in DeviceKind::ALL {
            self.orientations.get_mut(kind).reset();
        }

        if self.settings.reset_restores_position {
            debug!("Restoring initial device positions");
            for kind in DeviceKind::ALL {
                self.states.get_mut(kind).position = *self.initial_positions.get(kind);
            }
        }

        self.refresh_rotations(frame);
    }

    fn integrate(&mut self, input: &InputSample, frame: Quat) {
        let deltas = PerDevice {
            hmd: angular_delta(input.head_control, &self.settings.head),
            left: angular_delta(input.left_stick, &self.settings.hand),
            right: angular_delta(input.right_stick, &self.settings.hand),
        };

        for (kind, delta) in deltas.iter() {
            if *delta != Vec3::ZERO {
                debug!("{} delta {}", kind, delta);
            }
            self.orientations.get_mut(kind).add(*delta);
        }

        self.refresh_rotations(frame);
    }

    fn refresh_rotations(&mut self, frame: Quat) {
        for kind in DeviceKind::ALL {
            let rotation = frame * self.orientations.get(kind).rotation();
            self.states.get_mut(kind).rotation = rotation;
        }
    }

    fn map_controls(&mut self, input: &InputSample) {
        self.states.left.controls = Some(ControllerControls {
            grip: input.left_grip,
            trigger: input.left_bumper,
            axis_2d: input.left_stick,
            buttons: ControllerButtons {
                primary: input.button_x,
                secondary: input.button_y,
                menu: input.menu_button,
            },
        });

        self.states.right.controls = Some(ControllerControls {
            grip: input.right_grip,
            trigger: input.right_bumper,
            axis_2d: input.right_stick,
            buttons: ControllerButtons {
                primary: input.button_a,
                secondary: input.button_b,
                menu: input.aux_button,
            },
        });
    }
}
