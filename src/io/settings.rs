//! Publisher configuration.
//!
//! Settings come from a YAML file (or defaults). Invalid values never
//! abort startup: they are recovered locally to the documented defaults
//! with a warning, matching the behavior downstream consumers rely on.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use tracing::warn;

use crate::geometry::frames::{rotation_ground_cam, rotation_vehicle_cam};
use crate::geometry::rigid::is_rotation;
use crate::geometry::{MountCalibration, RigidTransform};

/// Camera frame rate used when the configured value is unset or < 1.
pub const DEFAULT_FPS: f64 = 30.0;
/// Image width used when the configured dimensions are invalid.
pub const DEFAULT_IMAGE_WIDTH: i32 = 640;
/// Image height used when the configured dimensions are invalid.
pub const DEFAULT_IMAGE_HEIGHT: i32 = 480;

/// A fixed mount transform as configured: row-major 3×3 rotation plus
/// translation.
#[derive(Debug, Clone, Deserialize)]
pub struct MountTransform {
    pub rotation: [f64; 9],
    pub translation: [f64; 3],
}

impl MountTransform {
    fn rotation_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_row_slice(&self.rotation)
    }

    fn translation_vector(&self) -> Vector3<f64> {
        Vector3::from_row_slice(&self.translation)
    }

    /// Whether the configured rotation block is a valid rotation.
    pub fn has_valid_rotation(&self) -> bool {
        is_rotation(&self.rotation_matrix())
    }

    pub fn to_rigid(&self) -> RigidTransform {
        RigidTransform::from_rotation_translation(
            self.rotation_matrix(),
            self.translation_vector(),
        )
    }
}

impl Default for MountTransform {
    /// The 90°-class axis permutation (camera RDF → FLU), zero translation.
    fn default() -> Self {
        let r = rotation_ground_cam();
        Self {
            rotation: [
                r[(0, 0)],
                r[(0, 1)],
                r[(0, 2)],
                r[(1, 0)],
                r[(1, 1)],
                r[(1, 2)],
                r[(2, 0)],
                r[(2, 1)],
                r[(2, 2)],
            ],
            translation: [0.0; 3],
        }
    }
}

/// Publisher settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherSettings {
    pub camera_fps: f64,
    pub image_width: i32,
    pub image_height: i32,
    pub cam_to_ground: MountTransform,
    pub cam_to_vehicle: MountTransform,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        let mut vehicle = MountTransform::default();
        // Same permutation; taken from the vehicle-side constant so the two
        // mounts stay independently configurable.
        let r = rotation_vehicle_cam();
        vehicle.rotation = [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
        ];
        Self {
            camera_fps: DEFAULT_FPS,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            cam_to_ground: MountTransform::default(),
            cam_to_vehicle: vehicle,
        }
    }
}

impl PublisherSettings {
    /// Load settings from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let settings: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings.normalized())
    }

    /// Replace invalid values with the documented defaults.
    ///
    /// Recovery is local and never fatal: fps < 1 (or NaN) falls back to
    /// 30, non-positive dimensions fall back to 640×480 together, and a
    /// mount with a non-orthonormal rotation block falls back to the axis
    /// permutation.
    pub fn normalized(mut self) -> Self {
        if !(self.camera_fps >= 1.0) {
            warn!(fps = self.camera_fps, "invalid camera fps, using default");
            self.camera_fps = DEFAULT_FPS;
        }
        if self.image_width < 1 || self.image_height < 1 {
            warn!(
                width = self.image_width,
                height = self.image_height,
                "invalid image dimensions, using defaults"
            );
            self.image_width = DEFAULT_IMAGE_WIDTH;
            self.image_height = DEFAULT_IMAGE_HEIGHT;
        }
        if !self.cam_to_ground.has_valid_rotation() {
            warn!("cam_to_ground rotation is not orthonormal, using default mount");
            self.cam_to_ground = MountTransform::default();
        }
        if !self.cam_to_vehicle.has_valid_rotation() {
            warn!("cam_to_vehicle rotation is not orthonormal, using default mount");
            self.cam_to_vehicle = MountTransform::default();
        }
        self
    }

    /// The camera frame interval (`1 / fps`).
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.camera_fps)
    }

    /// The two fixed mount transforms as rigid transforms.
    pub fn mount_calibration(&self) -> MountCalibration {
        MountCalibration::new(self.cam_to_ground.to_rigid(), self.cam_to_vehicle.to_rigid())
    }
}
