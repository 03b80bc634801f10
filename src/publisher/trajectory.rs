//! Projection of the engine's historical trajectory into the ground frame.

use crate::geometry::{MountCalibration, RigidTransform, GROUND_FRAME};
use crate::publisher::messages::{PoseSample, Trajectory};

/// Maps historical camera→world poses into ground-frame camera and vehicle
/// trajectories.
///
/// Pure given its inputs: the fixed transforms are copied at construction
/// and nothing here touches shared mutable state, so the pose loop can call
/// it on a trajectory snapshot without extra locking.
pub struct TrajectoryProjector {
    /// Camera → ground mount transform.
    t_ground_cam: RigidTransform,
    /// Vehicle → camera, inverse of the camera → vehicle mount.
    t_cam_vehicle: RigidTransform,
}

impl TrajectoryProjector {
    pub fn new(calib: &MountCalibration) -> Self {
        Self {
            t_ground_cam: calib.t_ground_cam,
            t_cam_vehicle: calib.t_vehicle_cam.inverse(),
        }
    }

    /// Project a pose history into `(camera trajectory, vehicle trajectory)`.
    ///
    /// Entries are already camera→world, so no inversion:
    /// `camGround = t_ground_cam ∘ entry` and
    /// `vehicleGround = camGround ∘ invert(t_vehicle_cam)`. The outputs are
    /// index-aligned to the input and preserve its order. Empty input gives
    /// empty trajectories, not an error.
    pub fn project(&self, history: &[RigidTransform], timestamp_ns: u64) -> (Trajectory, Trajectory) {
        let mut camera = Vec::with_capacity(history.len());
        let mut vehicle = Vec::with_capacity(history.len());

        for t_world_cam in history {
            let t_ground_cam = self.t_ground_cam.compose(t_world_cam);
            let t_ground_vehicle = t_ground_cam.compose(&self.t_cam_vehicle);
            camera.push(PoseSample::from_transform(
                &t_ground_cam,
                GROUND_FRAME,
                timestamp_ns,
            ));
            vehicle.push(PoseSample::from_transform(
                &t_ground_vehicle,
                GROUND_FRAME,
                timestamp_ns,
            ));
        }

        (
            Trajectory {
                frame_id: GROUND_FRAME,
                timestamp_ns,
                poses: camera,
            },
            Trajectory {
                frame_id: GROUND_FRAME,
                timestamp_ns,
                poses: vehicle,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};

    use super::*;

    fn projector() -> TrajectoryProjector {
        TrajectoryProjector::new(&MountCalibration::aligned())
    }

    #[test]
    fn test_empty_history_gives_empty_trajectories() {
        let (camera, vehicle) = projector().project(&[], 0);
        assert!(camera.is_empty());
        assert!(vehicle.is_empty());
    }

    #[test]
    fn test_length_and_order_preserved() {
        let history: Vec<RigidTransform> = (0..5)
            .map(|i| {
                RigidTransform::from_rotation_translation(
                    Matrix3::identity(),
                    Vector3::new(0.0, 0.0, f64::from(i)),
                )
            })
            .collect();

        let (camera, vehicle) = projector().project(&history, 9);
        assert_eq!(camera.len(), history.len());
        assert_eq!(vehicle.len(), history.len());

        // Camera forward (+Z in the native frame) maps to ground +X, so the
        // samples stay in input order along ground X.
        for (i, sample) in camera.poses.iter().enumerate() {
            assert_eq!(sample.timestamp_ns, 9);
            assert_relative_eq!(sample.position.x, i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_no_inversion_applied_to_history() {
        // A camera 3m forward of the origin, stored camera→world as-is.
        let entry = RigidTransform::from_rotation_translation(
            Matrix3::identity(),
            Vector3::new(0.0, 0.0, 3.0),
        );
        let (camera, _) = projector().project(&[entry], 0);
        assert_relative_eq!(
            camera.poses[0].position,
            Vector3::new(3.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_vehicle_offset_by_mount_inverse() {
        let calib = MountCalibration::new(
            MountCalibration::aligned().t_ground_cam,
            RigidTransform::from_rotation_translation(
                crate::geometry::frames::rotation_vehicle_cam(),
                Vector3::new(0.0, 0.0, 1.5),
            ),
        );
        let projector = TrajectoryProjector::new(&calib);
        let (camera, vehicle) = projector.project(&[RigidTransform::identity()], 0);

        // With an identity history entry the camera sits at the ground
        // origin and the vehicle at the mount offset mapped through the
        // composed transform.
        assert_relative_eq!(camera.poses[0].position, Vector3::zeros(), epsilon = 1e-12);
        let expected = calib
            .t_ground_cam
            .compose(&calib.t_vehicle_cam.inverse())
            .translation();
        assert_relative_eq!(vehicle.poses[0].position, expected, epsilon = 1e-12);
    }
}
