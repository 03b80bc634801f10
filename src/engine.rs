//! Query interfaces onto the localization engine.
//!
//! The engine itself (pose estimation, triangulation, keyframe selection) is
//! an external collaborator. This crate only consumes the narrow read
//! surface below: the tracked trajectory, the map-point collections, and a
//! pre-rendered frame overlay. Implementations snapshot their internal state
//! on each call; the publishing loops never hold engine locks.

use nalgebra::Vector3;

use crate::geometry::RigidTransform;
use crate::publisher::messages::FrameImage;

/// Unique identifier for a map point.
///
/// Map points are mutable entities with identity; reference-set membership
/// is decided by id, never by position value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapPointId(pub u64);

impl MapPointId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MapPointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MP{}", self.0)
    }
}

/// Read-only snapshot of a map point, taken at publish time.
#[derive(Debug, Clone, Copy)]
pub struct MapPoint {
    pub id: MapPointId,
    /// 3D position in the engine's native (first-camera) frame.
    pub position: Vector3<f64>,
    /// Marked bad by the engine; filtered out of every published cloud.
    pub is_bad: bool,
}

impl MapPoint {
    pub fn new(id: MapPointId, position: Vector3<f64>) -> Self {
        Self {
            id,
            position,
            is_bad: false,
        }
    }
}

/// Source of the historical camera trajectory.
pub trait TrajectorySource: Send + Sync {
    /// Camera→world poses, one per tracked frame, in the engine's native
    /// order. Unlike the live pose estimate these need no inversion.
    fn current_trajectory(&self) -> Vec<RigidTransform>;
}

/// Read access to the engine's map at publish time.
pub trait MapView: Send + Sync {
    /// Every map point in the full historical map.
    fn all_map_points(&self) -> Vec<MapPoint>;

    /// Map points in the engine's current local tracking window.
    fn reference_map_points(&self) -> Vec<MapPoint>;
}

/// Renders the current visual frame overlay.
pub trait FrameSource: Send + Sync {
    /// The composed overlay for the current frame, or `None` while no frame
    /// has been processed yet.
    fn draw_frame(&self) -> Option<FrameImage>;
}
