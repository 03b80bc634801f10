//! Coordinate frame conventions for ground-referenced publishing.
//!
//! Three frames matter here:
//!
//! 1. **Camera frame** - where the localization engine's poses live
//! 2. **Ground frame** - fixed world frame defined at system start, Z-up
//! 3. **Vehicle frame** - rigidly attached to the carrying platform
//!
//! ## Camera frame (RDF - computer vision convention)
//! ```text
//!        +Y (down)
//!         |
//!         |
//!         +------ +X (right)
//!        /
//!       /
//!      +Z (forward, optical axis)
//! ```
//!
//! ## Ground / vehicle frames (FLU)
//! ```text
//!        +Z (up)
//!         |
//!         |
//!         +------ +Y (left)
//!        /
//!       /
//!      +X (forward)
//! ```
//!
//! The engine's native origin is the first camera frame; the ground frame is
//! that origin re-axed through the fixed mount rotation below. The vehicle
//! frame is offset from the camera by an independent calibration transform
//! of the same structural form.
//!
//! # Transformation naming
//!
//! `t_target_source` transforms a point from `source` to `target`:
//! `p_ground = t_ground_cam * p_cam`.

use nalgebra::{Matrix3, Vector3};

use super::rigid::RigidTransform;

/// Frame label for the fixed ground frame.
pub const GROUND_FRAME: &str = "ground";
/// Frame label for the vehicle frame.
pub const VEHICLE_FRAME: &str = "vehicle";
/// Frame label for the camera image plane.
pub const IMAGE_FRAME: &str = "image";

/// Fixed rotation from camera frame (RDF) to ground frame (FLU).
///
/// Maps:
/// - Camera +Z (forward) → Ground +X (forward)
/// - Camera +X (right)   → Ground -Y (left)
/// - Camera +Y (down)    → Ground -Z (up)
#[rustfmt::skip]
pub fn rotation_ground_cam() -> Matrix3<f64> {
    Matrix3::new(
         0.0,  0.0, 1.0,  // Ground X = Camera Z
        -1.0,  0.0, 0.0,  // Ground Y = -Camera X
         0.0, -1.0, 0.0,  // Ground Z = -Camera Y
    )
}

/// Fixed rotation from camera frame (RDF) to vehicle frame (FLU).
///
/// Same axis permutation as [`rotation_ground_cam`]; kept separate because
/// the two mounts are independently configurable.
#[rustfmt::skip]
pub fn rotation_vehicle_cam() -> Matrix3<f64> {
    Matrix3::new(
         0.0,  0.0, 1.0,
        -1.0,  0.0, 0.0,
         0.0, -1.0, 0.0,
    )
}

/// The two fixed mount transforms, created once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct MountCalibration {
    /// Camera → ground rigid transform.
    pub t_ground_cam: RigidTransform,
    /// Camera → vehicle rigid transform.
    pub t_vehicle_cam: RigidTransform,
}

impl MountCalibration {
    pub fn new(t_ground_cam: RigidTransform, t_vehicle_cam: RigidTransform) -> Self {
        Self {
            t_ground_cam,
            t_vehicle_cam,
        }
    }

    /// Default mounts: both frames related to the camera by the pure axis
    /// permutation, zero translation.
    pub fn aligned() -> Self {
        Self {
            t_ground_cam: RigidTransform::from_rotation_translation(
                rotation_ground_cam(),
                Vector3::zeros(),
            ),
            t_vehicle_cam: RigidTransform::from_rotation_translation(
                rotation_vehicle_cam(),
                Vector3::zeros(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rigid::is_rotation;
    use approx::assert_relative_eq;

    #[test]
    fn test_mount_rotations_are_valid() {
        assert!(is_rotation(&rotation_ground_cam()));
        assert!(is_rotation(&rotation_vehicle_cam()));
    }

    #[test]
    fn test_camera_axes_map_to_ground_axes() {
        let r = rotation_ground_cam();
        // Camera forward (+Z) becomes ground forward (+X).
        assert_relative_eq!(r * Vector3::z(), Vector3::x(), epsilon = 1e-12);
        // Camera down (+Y) becomes ground down (-Z).
        assert_relative_eq!(r * Vector3::y(), -Vector3::z(), epsilon = 1e-12);
        // Camera right (+X) becomes ground right (-Y).
        assert_relative_eq!(r * Vector3::x(), -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_aligned_calibration_has_zero_translation() {
        let calib = MountCalibration::aligned();
        assert_relative_eq!(
            calib.t_ground_cam.translation(),
            Vector3::zeros(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            calib.t_vehicle_cam.translation(),
            Vector3::zeros(),
            epsilon = 1e-12
        );
    }
}
