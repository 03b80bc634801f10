//! The three publishing loops and their spawn/join protocol.
//!
//! One producer (the engine pushing poses into the store) and three
//! consumer loops, each on its own OS thread:
//!
//! 1. **Pose/path loop** - gated on the "new pose" flag; publishes the
//!    ground camera pose, ground vehicle pose, both projected trajectories
//!    and the vehicle-to-ground transform broadcast.
//! 2. **Point-cloud loop** - unconditional; reclassifies and publishes both
//!    clouds every half frame interval (map composition can change without
//!    a new pose).
//! 3. **Frame-overlay loop** - relays the collaborator's rendered frame
//!    every half frame interval.
//!
//! Every loop checks the finish flag once per iteration after producing
//! output and exits without emitting a partial cycle. Cancellation is
//! cooperative only; the pause flags are an external-caller mechanism and
//! are not consulted by the loops.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::engine::{FrameSource, MapView, TrajectorySource};
use crate::geometry::{GROUND_FRAME, VEHICLE_FRAME};
use crate::io::PublisherSettings;
use crate::publisher::lifecycle::LifecycleController;
use crate::publisher::messages::{now_ns, TransformStamped};
use crate::publisher::point_cloud::PointCloudClassifier;
use crate::publisher::sink::DataSink;
use crate::publisher::trajectory::TrajectoryProjector;
use crate::publisher::transform_store::FrameTransformStore;

/// Pose-loop tick: how long one wait on the new-pose flag may block before
/// the finish flag is re-checked.
const POSE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Publishes ground-referenced engine state until finish is requested.
pub struct SlamDataPublisher {
    store: Arc<FrameTransformStore>,
    lifecycle: Arc<LifecycleController>,
    projector: TrajectoryProjector,
    classifier: PointCloudClassifier,
    trajectory_source: Arc<dyn TrajectorySource>,
    map: Arc<dyn MapView>,
    frames: Arc<dyn FrameSource>,
    sink: Arc<dyn DataSink>,
    /// Half the camera frame interval; cadence of the cloud and overlay
    /// loops.
    half_frame_interval: Duration,
}

impl SlamDataPublisher {
    pub fn new(
        settings: &PublisherSettings,
        trajectory_source: Arc<dyn TrajectorySource>,
        map: Arc<dyn MapView>,
        frames: Arc<dyn FrameSource>,
        sink: Arc<dyn DataSink>,
    ) -> Self {
        let settings = settings.clone().normalized();
        let calib = settings.mount_calibration();

        Self {
            store: Arc::new(FrameTransformStore::new(&calib)),
            lifecycle: Arc::new(LifecycleController::new()),
            projector: TrajectoryProjector::new(&calib),
            classifier: PointCloudClassifier::new(&calib),
            trajectory_source,
            map,
            frames,
            sink,
            half_frame_interval: settings.frame_interval() / 2,
        }
    }

    /// The shared pose store; the engine producer pushes estimates here.
    pub fn store(&self) -> Arc<FrameTransformStore> {
        Arc::clone(&self.store)
    }

    /// The shared lifecycle controller; external callers request
    /// finish/stop through it.
    pub fn lifecycle(&self) -> Arc<LifecycleController> {
        Arc::clone(&self.lifecycle)
    }

    /// Run the publishing loops. Blocks the calling thread until finish.
    ///
    /// Clears the finished/stopped flags, spawns the three loops, joins the
    /// pose and point-cloud loops, then marks finished. The frame-overlay
    /// loop's handle is returned; joining it is the caller's decision.
    pub fn run(self: &Arc<Self>) -> JoinHandle<()> {
        self.lifecycle.start();

        let pose_handle = thread::spawn({
            let publisher = Arc::clone(self);
            move || publisher.pose_loop()
        });
        let cloud_handle = thread::spawn({
            let publisher = Arc::clone(self);
            move || publisher.point_cloud_loop()
        });
        let frame_handle = thread::spawn({
            let publisher = Arc::clone(self);
            move || publisher.frame_loop()
        });

        let _ = pose_handle.join();
        let _ = cloud_handle.join();
        self.lifecycle.mark_finished();
        debug!("publishing loops finished");

        frame_handle
    }

    /// Pose/path loop body: react as soon as a new estimate lands.
    fn pose_loop(&self) {
        loop {
            if self.store.wait_for_new_pose(POSE_POLL_INTERVAL) {
                self.publish_pose_outputs();
            }
            if self.lifecycle.is_finish_requested() {
                break;
            }
        }
    }

    /// One pose cycle: camera pose, vehicle pose, both paths, broadcast.
    fn publish_pose_outputs(&self) {
        let stamp = now_ns();

        // The camera pose must be computed first: it refreshes the
        // ground-camera cache the vehicle pose derives from.
        let Some(camera_pose) = self.store.current_ground_camera_pose(stamp) else {
            return;
        };
        let Some(vehicle_pose) = self.store.current_ground_vehicle_pose(stamp) else {
            return;
        };

        let history = self.trajectory_source.current_trajectory();
        let (camera_path, vehicle_path) = self.projector.project(&history, stamp);

        self.sink.publish_camera_pose(&camera_pose);
        self.sink.publish_vehicle_pose(&vehicle_pose);
        self.sink.publish_camera_path(&camera_path);
        self.sink.publish_vehicle_path(&vehicle_path);
        self.sink.broadcast_transform(&TransformStamped::from_pose(
            GROUND_FRAME,
            VEHICLE_FRAME,
            &vehicle_pose,
        ));
    }

    /// Point-cloud loop body: reclassify every cycle, gated only by the
    /// finish flag. An empty map is "no data": the cycle's output is
    /// skipped, not published as empty clouds.
    fn point_cloud_loop(&self) {
        loop {
            let all = self.map.all_map_points();
            let reference = self.map.reference_map_points();
            let (all_cloud, ref_cloud) = self.classifier.classify(&all, &reference, now_ns());
            if !all.is_empty() {
                self.sink.publish_all_points(&all_cloud);
                self.sink.publish_reference_points(&ref_cloud);
            }

            if self.lifecycle.is_finish_requested() {
                break;
            }
            thread::sleep(self.half_frame_interval);
        }
    }

    /// Frame-overlay loop body: relay the collaborator's rendered frame.
    /// `None` (no frame yet) skips the cycle.
    fn frame_loop(&self) {
        loop {
            if let Some(image) = self.frames.draw_frame() {
                self.sink.publish_frame(&image);
            }

            if self.lifecycle.is_finish_requested() {
                break;
            }
            thread::sleep(self.half_frame_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use parking_lot::Mutex;

    use super::*;
    use crate::engine::{MapPoint, MapPointId};
    use crate::geometry::RigidTransform;
    use crate::publisher::messages::FrameImage;
    use crate::publisher::sink::{ChannelSink, SinkReceivers};

    const RECV_TIMEOUT: Duration = Duration::from_secs(2);
    const SILENCE_TIMEOUT: Duration = Duration::from_millis(200);

    /// Fixed engine state for driving the loops.
    struct StaticEngine {
        trajectory: Mutex<Vec<RigidTransform>>,
        all_points: Mutex<Vec<MapPoint>>,
        reference_points: Mutex<Vec<MapPoint>>,
        frame: Mutex<Option<FrameImage>>,
    }

    impl StaticEngine {
        fn empty() -> Self {
            Self {
                trajectory: Mutex::new(Vec::new()),
                all_points: Mutex::new(Vec::new()),
                reference_points: Mutex::new(Vec::new()),
                frame: Mutex::new(None),
            }
        }
    }

    impl TrajectorySource for StaticEngine {
        fn current_trajectory(&self) -> Vec<RigidTransform> {
            self.trajectory.lock().clone()
        }
    }

    impl MapView for StaticEngine {
        fn all_map_points(&self) -> Vec<MapPoint> {
            self.all_points.lock().clone()
        }

        fn reference_map_points(&self) -> Vec<MapPoint> {
            self.reference_points.lock().clone()
        }
    }

    impl FrameSource for StaticEngine {
        fn draw_frame(&self) -> Option<FrameImage> {
            self.frame.lock().clone()
        }
    }

    fn publisher_with(
        engine: Arc<StaticEngine>,
    ) -> (Arc<SlamDataPublisher>, SinkReceivers) {
        let (sink, receivers) = ChannelSink::unbounded();
        let publisher = Arc::new(SlamDataPublisher::new(
            &PublisherSettings::default(),
            Arc::clone(&engine) as Arc<dyn TrajectorySource>,
            Arc::clone(&engine) as Arc<dyn MapView>,
            engine as Arc<dyn FrameSource>,
            Arc::new(sink),
        ));
        (publisher, receivers)
    }

    fn run_on_thread(publisher: &Arc<SlamDataPublisher>) -> thread::JoinHandle<()> {
        let publisher = Arc::clone(publisher);
        thread::spawn(move || {
            let overlay = publisher.run();
            let _ = overlay.join();
        })
    }

    #[test]
    fn test_pose_outputs_emitted_once_per_new_pose() {
        let engine = Arc::new(StaticEngine::empty());
        engine
            .trajectory
            .lock()
            .extend([RigidTransform::identity(), RigidTransform::identity()]);

        let (publisher, rx) = publisher_with(engine);
        let store = publisher.store();
        let lifecycle = publisher.lifecycle();
        let runner = run_on_thread(&publisher);

        store.set_camera_pose(&RigidTransform::identity());

        let camera_pose = rx.camera_pose.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_relative_eq!(camera_pose.position, Vector3::zeros(), epsilon = 1e-12);
        assert_eq!(camera_pose.frame_id, GROUND_FRAME);

        let vehicle_pose = rx.vehicle_pose.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(vehicle_pose.frame_id, VEHICLE_FRAME);

        let camera_path = rx.camera_path.recv_timeout(RECV_TIMEOUT).unwrap();
        let vehicle_path = rx.vehicle_path.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(camera_path.len(), 2);
        assert_eq!(vehicle_path.len(), 2);

        let tf = rx.transform.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(tf.parent_frame, GROUND_FRAME);
        assert_eq!(tf.child_frame, VEHICLE_FRAME);
        assert_eq!(tf.translation, vehicle_pose.position);
        assert_eq!(tf.rotation, vehicle_pose.orientation);

        // The flag was consumed: no further pose output without a new
        // estimate.
        assert!(rx.camera_pose.recv_timeout(SILENCE_TIMEOUT).is_err());

        lifecycle.request_finish();
        runner.join().unwrap();
        assert!(lifecycle.is_finished());
    }

    #[test]
    fn test_point_cloud_loop_runs_without_poses() {
        let engine = Arc::new(StaticEngine::empty());
        {
            let mut all = engine.all_points.lock();
            all.push(MapPoint::new(MapPointId::new(1), Vector3::new(0.0, 0.0, 1.0)));
            all.push(MapPoint::new(MapPointId::new(2), Vector3::new(0.0, 0.0, 2.0)));
            engine.reference_points.lock().push(all[1]);
        }

        let (publisher, rx) = publisher_with(engine);
        let lifecycle = publisher.lifecycle();
        let runner = run_on_thread(&publisher);

        // Clouds keep coming on their own cadence, no pose required.
        let first = rx.all_points.recv_timeout(RECV_TIMEOUT).unwrap();
        let second = rx.all_points.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        let reference = rx.reference_points.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(reference.len(), 1);

        // No pose was ever set: the pose outputs stay silent.
        assert!(rx.camera_pose.try_recv().is_err());

        lifecycle.request_finish();
        runner.join().unwrap();
    }

    #[test]
    fn test_empty_map_publishes_no_clouds() {
        let engine = Arc::new(StaticEngine::empty());
        let (publisher, rx) = publisher_with(engine);
        let lifecycle = publisher.lifecycle();
        let runner = run_on_thread(&publisher);

        assert!(rx.all_points.recv_timeout(SILENCE_TIMEOUT).is_err());
        assert!(rx.reference_points.try_recv().is_err());

        lifecycle.request_finish();
        runner.join().unwrap();
    }

    #[test]
    fn test_frame_loop_relays_overlay() {
        let engine = Arc::new(StaticEngine::empty());
        *engine.frame.lock() = Some(FrameImage {
            frame_id: crate::geometry::IMAGE_FRAME,
            timestamp_ns: 0,
            width: 2,
            height: 1,
            data: vec![0; 6],
        });

        let (publisher, rx) = publisher_with(engine);
        let lifecycle = publisher.lifecycle();
        let runner = run_on_thread(&publisher);

        let image = rx.frame.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.data.len(), 6);

        lifecycle.request_finish();
        runner.join().unwrap();
    }

    #[test]
    fn test_finish_terminates_all_loops() {
        let engine = Arc::new(StaticEngine::empty());
        let (publisher, _rx) = publisher_with(engine);
        let lifecycle = publisher.lifecycle();

        let runner = run_on_thread(&publisher);
        assert!(!lifecycle.is_finished());

        lifecycle.request_finish();
        runner.join().unwrap();
        assert!(lifecycle.is_finished());
    }
}
