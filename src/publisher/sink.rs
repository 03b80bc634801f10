//! The publish surface consumed by the loops.
//!
//! [`DataSink`] defines the semantic content of each output; the transport
//! behind it is a consumer concern. [`ChannelSink`] carries the outputs
//! over crossbeam channels for tests and in-process embedding.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::publisher::messages::{FrameImage, PointCloud, PoseSample, TransformStamped, Trajectory};

/// Receives one cycle's worth of published data.
///
/// Implementations must be cheap and non-blocking; a sink that loses its
/// consumer must swallow the failure rather than kill a publishing loop.
pub trait DataSink: Send + Sync {
    fn publish_camera_pose(&self, pose: &PoseSample);
    fn publish_vehicle_pose(&self, pose: &PoseSample);
    fn publish_camera_path(&self, path: &Trajectory);
    fn publish_vehicle_path(&self, path: &Trajectory);
    fn broadcast_transform(&self, tf: &TransformStamped);
    fn publish_all_points(&self, cloud: &PointCloud);
    fn publish_reference_points(&self, cloud: &PointCloud);
    fn publish_frame(&self, image: &FrameImage);
}

/// Channel-backed sink: one unbounded channel per output.
pub struct ChannelSink {
    camera_pose: Sender<PoseSample>,
    vehicle_pose: Sender<PoseSample>,
    camera_path: Sender<Trajectory>,
    vehicle_path: Sender<Trajectory>,
    transform: Sender<TransformStamped>,
    all_points: Sender<PointCloud>,
    reference_points: Sender<PointCloud>,
    frame: Sender<FrameImage>,
}

/// The receiving ends paired with a [`ChannelSink`].
pub struct SinkReceivers {
    pub camera_pose: Receiver<PoseSample>,
    pub vehicle_pose: Receiver<PoseSample>,
    pub camera_path: Receiver<Trajectory>,
    pub vehicle_path: Receiver<Trajectory>,
    pub transform: Receiver<TransformStamped>,
    pub all_points: Receiver<PointCloud>,
    pub reference_points: Receiver<PointCloud>,
    pub frame: Receiver<FrameImage>,
}

impl ChannelSink {
    pub fn unbounded() -> (Self, SinkReceivers) {
        let (camera_pose_tx, camera_pose_rx) = unbounded();
        let (vehicle_pose_tx, vehicle_pose_rx) = unbounded();
        let (camera_path_tx, camera_path_rx) = unbounded();
        let (vehicle_path_tx, vehicle_path_rx) = unbounded();
        let (transform_tx, transform_rx) = unbounded();
        let (all_points_tx, all_points_rx) = unbounded();
        let (reference_points_tx, reference_points_rx) = unbounded();
        let (frame_tx, frame_rx) = unbounded();

        (
            Self {
                camera_pose: camera_pose_tx,
                vehicle_pose: vehicle_pose_tx,
                camera_path: camera_path_tx,
                vehicle_path: vehicle_path_tx,
                transform: transform_tx,
                all_points: all_points_tx,
                reference_points: reference_points_tx,
                frame: frame_tx,
            },
            SinkReceivers {
                camera_pose: camera_pose_rx,
                vehicle_pose: vehicle_pose_rx,
                camera_path: camera_path_rx,
                vehicle_path: vehicle_path_rx,
                transform: transform_rx,
                all_points: all_points_rx,
                reference_points: reference_points_rx,
                frame: frame_rx,
            },
        )
    }
}

impl DataSink for ChannelSink {
    fn publish_camera_pose(&self, pose: &PoseSample) {
        let _ = self.camera_pose.send(pose.clone());
    }

    fn publish_vehicle_pose(&self, pose: &PoseSample) {
        let _ = self.vehicle_pose.send(pose.clone());
    }

    fn publish_camera_path(&self, path: &Trajectory) {
        let _ = self.camera_path.send(path.clone());
    }

    fn publish_vehicle_path(&self, path: &Trajectory) {
        let _ = self.vehicle_path.send(path.clone());
    }

    fn broadcast_transform(&self, tf: &TransformStamped) {
        let _ = self.transform.send(tf.clone());
    }

    fn publish_all_points(&self, cloud: &PointCloud) {
        let _ = self.all_points.send(cloud.clone());
    }

    fn publish_reference_points(&self, cloud: &PointCloud) {
        let _ = self.reference_points.send(cloud.clone());
    }

    fn publish_frame(&self, image: &FrameImage) {
        let _ = self.frame.send(image.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RigidTransform, GROUND_FRAME};

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, rx) = ChannelSink::unbounded();
        let pose = PoseSample::from_transform(&RigidTransform::identity(), GROUND_FRAME, 1);
        sink.publish_camera_pose(&pose);
        assert_eq!(rx.camera_pose.try_recv().unwrap(), pose);
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (sink, rx) = ChannelSink::unbounded();
        drop(rx);
        let pose = PoseSample::from_transform(&RigidTransform::identity(), GROUND_FRAME, 1);
        sink.publish_camera_pose(&pose);
    }
}
