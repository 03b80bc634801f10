//! Shared pose state between the engine (producer) and the publishing loops.
//!
//! The store owns the fixed mount transforms (immutable after construction)
//! and the live camera pose estimate behind one mutex. A single "new pose"
//! flag implements latest-wins delivery: the producer sets it on every
//! write, and exactly one consumer (the pose loop, via
//! [`FrameTransformStore::current_ground_camera_pose`]) clears it. If the
//! consumer is slower than the producer, intermediate poses are dropped.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::geometry::{MountCalibration, RigidTransform, GROUND_FRAME, VEHICLE_FRAME};
use crate::publisher::messages::PoseSample;

/// Mutable pose state, guarded as one unit so readers never observe a torn
/// write.
struct PoseState {
    /// The engine's live world→camera estimate (`t_cam_world`). `None`
    /// until the first estimate lands; never reset afterwards.
    camera_pose: Option<RigidTransform>,

    /// Set on every `set_camera_pose`, cleared only when the pose loop
    /// consumes the estimate.
    fresh: bool,

    /// Derived cache: camera pose in the ground frame, refreshed by
    /// `current_ground_camera_pose`.
    t_ground_cam_now: RigidTransform,

    /// Derived cache: vehicle pose in the ground frame, refreshed by
    /// `current_ground_vehicle_pose`. Only as fresh as the last
    /// ground-camera refresh (see the ordering contract below).
    t_ground_vehicle_now: RigidTransform,
}

/// Fixed frame transforms plus the guarded live pose.
pub struct FrameTransformStore {
    /// Camera → ground mount transform.
    t_ground_cam: RigidTransform,
    /// Camera → vehicle mount transform.
    t_vehicle_cam: RigidTransform,
    /// Vehicle → camera, cached inverse of `t_vehicle_cam`.
    t_cam_vehicle: RigidTransform,

    state: Mutex<PoseState>,
    new_pose: Condvar,
}

impl FrameTransformStore {
    /// Build the store from the fixed mount calibration. The rotation
    /// blocks are validated upstream when loaded from configuration.
    pub fn new(calib: &MountCalibration) -> Self {
        Self {
            t_ground_cam: calib.t_ground_cam,
            t_vehicle_cam: calib.t_vehicle_cam,
            t_cam_vehicle: calib.t_vehicle_cam.inverse(),
            state: Mutex::new(PoseState {
                camera_pose: None,
                fresh: false,
                t_ground_cam_now: RigidTransform::identity(),
                t_ground_vehicle_now: RigidTransform::identity(),
            }),
            new_pose: Condvar::new(),
        }
    }

    /// The fixed camera → ground transform.
    pub fn t_ground_cam(&self) -> &RigidTransform {
        &self.t_ground_cam
    }

    /// The fixed camera → vehicle transform.
    pub fn t_vehicle_cam(&self) -> &RigidTransform {
        &self.t_vehicle_cam
    }

    /// Producer side: store a new world→camera estimate.
    ///
    /// The pose is copied in (the store never aliases the caller's buffer),
    /// the "new pose" flag is raised, and any waiting consumer is woken.
    pub fn set_camera_pose(&self, pose: &RigidTransform) {
        let mut state = self.state.lock();
        state.camera_pose = Some(*pose);
        state.fresh = true;
        drop(state);
        self.new_pose.notify_all();
    }

    /// Whether an unconsumed estimate is pending.
    pub fn has_new_pose(&self) -> bool {
        self.state.lock().fresh
    }

    /// Block until a new estimate lands or `timeout` elapses; returns the
    /// flag state on wake. The pose loop's low-CPU replacement for a busy
    /// poll on the flag.
    pub fn wait_for_new_pose(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.fresh {
            let _ = self.new_pose.wait_for(&mut state, timeout);
        }
        state.fresh
    }

    /// The camera pose in the ground frame, consuming the "new pose" flag.
    ///
    /// `t_ground_cam_now = t_ground_cam ∘ invert(camera_pose)` - the live
    /// estimate is world→camera and needs inversion, unlike historical
    /// trajectory entries. Refreshes the ground-camera cache. Returns
    /// `None` while no estimate has arrived; that is "no output this
    /// cycle", not an error.
    ///
    /// This is the only operation that clears the flag, so exactly one loop
    /// acts as the flag consumer.
    pub fn current_ground_camera_pose(&self, timestamp_ns: u64) -> Option<PoseSample> {
        let mut state = self.state.lock();
        let t_cam_world = state.camera_pose.as_ref()?;
        let t_ground_cam_now = self.t_ground_cam.compose(&t_cam_world.inverse());
        state.t_ground_cam_now = t_ground_cam_now;
        state.fresh = false;
        drop(state);

        Some(PoseSample::from_transform(
            &t_ground_cam_now,
            GROUND_FRAME,
            timestamp_ns,
        ))
    }

    /// The vehicle pose in the ground frame. Does not touch the flag.
    ///
    /// `t_ground_vehicle_now = t_ground_cam_now ∘ invert(t_vehicle_cam)`,
    /// computed from the cached ground-camera pose. Precondition: only as
    /// fresh as the last [`Self::current_ground_camera_pose`] call - the
    /// pose loop must call that first in the same iteration, and callers
    /// outside that loop must not assume freshness.
    pub fn current_ground_vehicle_pose(&self, timestamp_ns: u64) -> Option<PoseSample> {
        let mut state = self.state.lock();
        if state.camera_pose.is_none() {
            return None;
        }
        let t_ground_vehicle_now = state.t_ground_cam_now.compose(&self.t_cam_vehicle);
        state.t_ground_vehicle_now = t_ground_vehicle_now;
        drop(state);

        Some(PoseSample::from_transform(
            &t_ground_vehicle_now,
            VEHICLE_FRAME,
            timestamp_ns,
        ))
    }

    /// The cached derived poses `(ground←camera, ground←vehicle)` without
    /// recomputation, for readers such as a transform broadcaster. Subject
    /// to the same freshness contract as the methods that refresh them.
    /// `None` while no estimate has arrived.
    pub fn latest_ground_poses(&self) -> Option<(RigidTransform, RigidTransform)> {
        let state = self.state.lock();
        state.camera_pose.as_ref()?;
        Some((state.t_ground_cam_now, state.t_ground_vehicle_now))
    }
}
