//! Published value types.
//!
//! These are plain-data structs carrying the semantic content of each
//! output; transport and serialization are a consumer concern. Shapes
//! follow the usual stamped pose / path / transform message layouts.

use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::{UnitQuaternion, Vector3};

use crate::geometry::RigidTransform;

/// Wall-clock timestamp in nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A stamped pose: position plus unit-quaternion orientation in `frame_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub frame_id: &'static str,
    pub timestamp_ns: u64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl PoseSample {
    /// Derive a sample from a rigid transform's translation column and
    /// rotation block.
    pub fn from_transform(t: &RigidTransform, frame_id: &'static str, timestamp_ns: u64) -> Self {
        Self {
            frame_id,
            timestamp_ns,
            position: t.translation(),
            orientation: t.orientation(),
        }
    }
}

/// An ordered pose sequence, in the source engine's order.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub frame_id: &'static str,
    pub timestamp_ns: u64,
    pub poses: Vec<PoseSample>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

/// RGBA color, 8 bits per channel.
pub type Rgba = [u8; 4];

/// A ground-frame point with a classification color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredPoint {
    pub position: Vector3<f64>,
    pub color: Rgba,
}

/// A stamped collection of colored points.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub frame_id: &'static str,
    pub timestamp_ns: u64,
    pub points: Vec<ColoredPoint>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A stamped transform between two named frames, broadcast-style.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStamped {
    pub parent_frame: &'static str,
    pub child_frame: &'static str,
    pub timestamp_ns: u64,
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl TransformStamped {
    /// Build a broadcast from an already-computed pose: the child frame's
    /// pose expressed in the parent frame, position and orientation reused
    /// verbatim.
    pub fn from_pose(parent_frame: &'static str, child_frame: &'static str, pose: &PoseSample) -> Self {
        Self {
            parent_frame,
            child_frame,
            timestamp_ns: pose.timestamp_ns,
            translation: pose.position,
            rotation: pose.orientation,
        }
    }
}

/// A rendered frame overlay, RGB8 row-major.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub frame_id: &'static str,
    pub timestamp_ns: u64,
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}
