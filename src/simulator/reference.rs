//! Reference pose (the "camera") used for space computations

use glam::{Quat, Vec3};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl ReferencePose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for ReferencePose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Source of the reference pose, polled once per tick
///
/// `None` means the reference is currently missing.
pub trait ReferenceSource: Send {
    fn reference_pose(&self) -> Option<ReferencePose>;
}

/// A reference that never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedReference(pub ReferencePose);

impl ReferenceSource for FixedReference {
    fn reference_pose(&self) -> Option<ReferencePose> {
        Some(self.0)
    }
}

/// Reference fed from another task; the sender may publish `None`
impl ReferenceSource for watch::Receiver<Option<ReferencePose>> {
    fn reference_pose(&self) -> Option<ReferencePose> {
        *self.borrow()
    }
}
