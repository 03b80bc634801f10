//! Classification and ground-frame transform of map-point clouds.

use std::collections::HashSet;

use crate::engine::{MapPoint, MapPointId};
use crate::geometry::{MountCalibration, RigidTransform, GROUND_FRAME};
use crate::publisher::messages::{ColoredPoint, PointCloud, Rgba};

/// Color for general map points.
pub const COLOR_ALL: Rgba = [255, 255, 255, 255];
/// Color for reference (local tracking window) map points.
pub const COLOR_REFERENCE: Rgba = [255, 0, 0, 255];

/// Partitions map points into "all" and "reference" clouds in the ground
/// frame.
pub struct PointCloudClassifier {
    t_ground_cam: RigidTransform,
}

impl PointCloudClassifier {
    pub fn new(calib: &MountCalibration) -> Self {
        Self {
            t_ground_cam: calib.t_ground_cam,
        }
    }

    /// Classify the map snapshot into `(all cloud, reference cloud)`.
    ///
    /// Reference membership is by id (points are entities with identity,
    /// not values). Bad points are filtered silently from both passes, and
    /// a point in the reference set is skipped on the "all" pass so no
    /// point appears in both outputs. Positions are transformed by the
    /// fixed camera→ground mount as homogeneous 4-vectors with `w = 1`.
    ///
    /// An empty `all_points` short-circuits to two empty clouds - no
    /// reference set is built, and the caller reads it as "no map yet".
    pub fn classify(
        &self,
        all_points: &[MapPoint],
        reference_points: &[MapPoint],
        timestamp_ns: u64,
    ) -> (PointCloud, PointCloud) {
        let mut all_cloud = PointCloud {
            frame_id: GROUND_FRAME,
            timestamp_ns,
            points: Vec::new(),
        };
        let mut ref_cloud = PointCloud {
            frame_id: GROUND_FRAME,
            timestamp_ns,
            points: Vec::new(),
        };

        if all_points.is_empty() {
            return (all_cloud, ref_cloud);
        }

        let reference_ids: HashSet<MapPointId> =
            reference_points.iter().map(|p| p.id).collect();

        for point in all_points {
            if point.is_bad || reference_ids.contains(&point.id) {
                continue;
            }
            all_cloud.points.push(ColoredPoint {
                position: self.t_ground_cam.transform_point(&point.position),
                color: COLOR_ALL,
            });
        }

        for point in reference_points {
            if point.is_bad {
                continue;
            }
            ref_cloud.points.push(ColoredPoint {
                position: self.t_ground_cam.transform_point(&point.position),
                color: COLOR_REFERENCE,
            });
        }

        (all_cloud, ref_cloud)
    }
}
