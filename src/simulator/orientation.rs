//! Euler angle accumulation for the simulated devices
//!
//! Angles are kept in degrees as `(pitch, yaw, roll)` in the `x`, `y` and `z`
//! components. Conversion to a rotation applies yaw about +Y, then pitch
//! about the rotated +X, then roll about the rotated +Z
//! ([`EulerRot::YXZ`], intrinsic).
//!
//! The accumulator itself never wraps or clamps. Two accumulators that
//! differ by multiples of 360° per component describe the same rotation.

use glam::{EulerRot, Quat, Vec3};

/// Axis order used for every Euler conversion in the crate
pub const ROTATION_ORDER: EulerRot = EulerRot::YXZ;

/// Running sum of pitch/yaw/roll deltas, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAccumulator {
    angles: Vec3,
}

impl EulerAccumulator {
    pub const ZERO: Self = Self { angles: Vec3::ZERO };

    pub fn from_degrees(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self {
            angles: Vec3::new(pitch, yaw, roll),
        }
    }

    /// Inverse of [`rotation`](Self::rotation), see [`quat_to_euler`]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            angles: quat_to_euler(rotation),
        }
    }

    /// `(pitch, yaw, roll)` in degrees, unwrapped
    pub fn angles(&self) -> Vec3 {
        self.angles
    }

    pub fn pitch(&self) -> f32 {
        self.angles.x
    }

    pub fn yaw(&self) -> f32 {
        self.angles.y
    }

    pub fn roll(&self) -> f32 {
        self.angles.z
    }

    pub fn add(&mut self, delta: Vec3) {
        self.angles += delta;
    }

    pub fn reset(&mut self) {
        self.angles = Vec3::ZERO;
    }

    pub fn is_zero(&self) -> bool {
        self.angles == Vec3::ZERO
    }

    /// Angles folded into `(-180, 180]`
    pub fn wrapped(&self) -> Vec3 {
        Vec3::new(
            wrap_degrees(self.angles.x),
            wrap_degrees(self.angles.y),
            wrap_degrees(self.angles.z),
        )
    }

    pub fn rotation(&self) -> Quat {
        euler_to_quat(self.angles)
    }
}

/// `(pitch, yaw, roll)` degrees to a unit quaternion
pub fn euler_to_quat(angles: Vec3) -> Quat {
    Quat::from_euler(
        ROTATION_ORDER,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    )
}

/// Unit quaternion to `(pitch, yaw, roll)` degrees
///
/// Defined for pitch strictly inside (-90°, 90°); at the poles yaw and roll
/// are not separable and the split is arbitrary.
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(ROTATION_ORDER);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() <= EPSILON, "{a} != {b}");
    }

    #[test]
    fn zero_is_identity() {
        let accumulator = EulerAccumulator::ZERO;
        assert!(accumulator.is_zero());
        assert!(accumulator.rotation().abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn add_sums_componentwise_without_wrapping() {
        let mut accumulator = EulerAccumulator::default();
        accumulator.add(Vec3::new(10.0, 200.0, 0.0));
        accumulator.add(Vec3::new(-5.0, 200.0, 0.0));
        assert_eq!(accumulator.angles(), Vec3::new(5.0, 400.0, 0.0));
        approx_eq(accumulator.wrapped(), Vec3::new(5.0, 40.0, 0.0));
    }

    #[test]
    fn reset_is_exactly_zero() {
        let mut accumulator = EulerAccumulator::from_degrees(12.5, -730.0, 3.0);
        accumulator.reset();
        assert_eq!(accumulator.angles(), Vec3::ZERO);
    }

    #[test]
    fn yaw_turns_about_vertical_axis() {
        let rotation = EulerAccumulator::from_degrees(0.0, 90.0, 0.0).rotation();
        approx_eq(rotation * Vec3::NEG_Z, Vec3::NEG_X);
        approx_eq(rotation * Vec3::Y, Vec3::Y);
    }

    #[test]
    fn pitch_turns_about_lateral_axis() {
        let rotation = EulerAccumulator::from_degrees(90.0, 0.0, 0.0).rotation();
        approx_eq(rotation * Vec3::NEG_Z, Vec3::Y);
        approx_eq(rotation * Vec3::X, Vec3::X);
    }

    #[test]
    fn yaw_is_applied_before_pitch() {
        // yaw 90 then pitch 90 about the turned X axis points forward straight up
        let rotation = EulerAccumulator::from_degrees(90.0, 90.0, 0.0).rotation();
        approx_eq(rotation * Vec3::NEG_Z, Vec3::Y);
        approx_eq(rotation * Vec3::X, Vec3::NEG_Z);
    }

    #[test]
    fn round_trip_recovers_angles() {
        for angles in [
            Vec3::new(30.0, -45.0, 0.0),
            Vec3::new(-80.0, 170.0, 0.0),
            Vec3::new(15.0, 60.0, -25.0),
        ] {
            let back = EulerAccumulator::from_rotation(euler_to_quat(angles));
            approx_eq(back.angles(), angles);
        }
    }

    #[test]
    fn round_trip_matches_modulo_wrap() {
        let accumulator = EulerAccumulator::from_degrees(20.0, 370.0, 0.0);
        let back = EulerAccumulator::from_rotation(accumulator.rotation());
        approx_eq(back.wrapped(), accumulator.wrapped());
        approx_eq(back.angles(), Vec3::new(20.0, 10.0, 0.0));
    }

    #[test]
    fn wrap_degrees_folds_into_half_open_range() {
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-720.0), 0.0);
    }
}
