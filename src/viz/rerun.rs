//! Rerun-backed data sink.
//!
//! Entity hierarchy:
//!     ground/
//!         camera           - Current camera pose (frustum transform)
//!         vehicle          - Current vehicle pose
//!         camera_path      - Projected camera trajectory (gray line)
//!         vehicle_path     - Projected vehicle trajectory (blue line)
//!         points/all       - Full map cloud (per-point colors)
//!         points/reference - Local tracking window cloud
//!         tf/vehicle       - Vehicle-to-ground transform broadcast
//!     camera/
//!         frame            - Rendered frame overlay

use std::sync::OnceLock;

use anyhow::{Context, Result};
use rerun::{external::glam, RecordingStream};

use crate::publisher::messages::{
    FrameImage, PointCloud, PoseSample, TransformStamped, Trajectory,
};
use crate::publisher::sink::DataSink;

pub struct RerunSink {
    rec: RecordingStream,
    start_timestamp_ns: OnceLock<u64>,
}

impl RerunSink {
    /// Spawn a rerun viewer process and connect a recording stream to it.
    pub fn new(app_name: &str) -> Result<Self> {
        let rec = rerun::RecordingStreamBuilder::new(app_name)
            .spawn()
            .context("Failed to spawn rerun viewer")?;

        // The ground frame is X-forward, Y-left, Z-up.
        rec.log_static("ground", &rerun::ViewCoordinates::FLU()).ok();

        Ok(Self {
            rec,
            start_timestamp_ns: OnceLock::new(),
        })
    }

    /// Place subsequent logs at the sample's time, relative to the first
    /// sample seen.
    fn set_time(&self, timestamp_ns: u64) {
        let start_ns = *self.start_timestamp_ns.get_or_init(|| timestamp_ns);
        let relative_sec = timestamp_ns.saturating_sub(start_ns) as f64 / 1e9;
        self.rec.set_duration_secs("time", relative_sec);
    }

    fn log_pose(&self, entity: &str, pose: &PoseSample) {
        self.set_time(pose.timestamp_ns);
        let translation = glam::Vec3::new(
            pose.position.x as f32,
            pose.position.y as f32,
            pose.position.z as f32,
        );
        let rotation = glam::Quat::from_xyzw(
            pose.orientation.coords.x as f32,
            pose.orientation.coords.y as f32,
            pose.orientation.coords.z as f32,
            pose.orientation.w as f32,
        );
        self.rec
            .log(
                entity,
                &rerun::Transform3D::from_translation_rotation(translation, rotation),
            )
            .ok();
    }

    fn log_path(&self, entity: &str, path: &Trajectory, color: [u8; 3]) {
        if path.len() < 2 {
            return;
        }
        self.set_time(path.timestamp_ns);
        let pts: Vec<[f32; 3]> = path
            .poses
            .iter()
            .map(|p| [p.position.x as f32, p.position.y as f32, p.position.z as f32])
            .collect();
        self.rec
            .log(
                entity,
                &rerun::LineStrips3D::new([pts])
                    .with_colors([color])
                    .with_radii([0.01f32]),
            )
            .ok();
    }

    fn log_cloud(&self, entity: &str, cloud: &PointCloud) {
        if cloud.is_empty() {
            return;
        }
        self.set_time(cloud.timestamp_ns);
        let pts: Vec<[f32; 3]> = cloud
            .points
            .iter()
            .map(|p| [p.position.x as f32, p.position.y as f32, p.position.z as f32])
            .collect();
        let colors: Vec<rerun::Color> = cloud
            .points
            .iter()
            .map(|p| rerun::Color::from_unmultiplied_rgba(p.color[0], p.color[1], p.color[2], p.color[3]))
            .collect();
        self.rec
            .log(
                entity,
                &rerun::Points3D::new(pts)
                    .with_colors(colors)
                    .with_radii([0.02f32]),
            )
            .ok();
    }
}

impl DataSink for RerunSink {
    fn publish_camera_pose(&self, pose: &PoseSample) {
        self.log_pose("ground/camera", pose);
    }

    fn publish_vehicle_pose(&self, pose: &PoseSample) {
        self.log_pose("ground/vehicle", pose);
    }

    fn publish_camera_path(&self, path: &Trajectory) {
        self.log_path("ground/camera_path", path, [128, 128, 128]);
    }

    fn publish_vehicle_path(&self, path: &Trajectory) {
        self.log_path("ground/vehicle_path", path, [0, 100, 255]);
    }

    fn broadcast_transform(&self, tf: &TransformStamped) {
        self.set_time(tf.timestamp_ns);
        let translation = glam::Vec3::new(
            tf.translation.x as f32,
            tf.translation.y as f32,
            tf.translation.z as f32,
        );
        let rotation = glam::Quat::from_xyzw(
            tf.rotation.coords.x as f32,
            tf.rotation.coords.y as f32,
            tf.rotation.coords.z as f32,
            tf.rotation.w as f32,
        );
        let entity = format!("{}/tf/{}", tf.parent_frame, tf.child_frame);
        self.rec
            .log(
                entity,
                &rerun::Transform3D::from_translation_rotation(translation, rotation),
            )
            .ok();
    }

    fn publish_all_points(&self, cloud: &PointCloud) {
        self.log_cloud("ground/points/all", cloud);
    }

    fn publish_reference_points(&self, cloud: &PointCloud) {
        self.log_cloud("ground/points/reference", cloud);
    }

    fn publish_frame(&self, image: &FrameImage) {
        self.set_time(image.timestamp_ns);
        self.rec
            .log(
                "camera/frame",
                &rerun::Image::from_rgb24(image.data.clone(), [image.width, image.height]),
            )
            .ok();
    }
}
