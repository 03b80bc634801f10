//! Demo: a synthetic localization engine driving the publisher into a
//! rerun viewer.
//!
//! The engine follows a circular drive, growing a trajectory and a scatter
//! of map points along the way, and composes a procedural frame overlay.
//! A producer thread pushes the live pose at the configured frame rate
//! while the three publishing loops run against the rerun sink.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use nalgebra::{Rotation3, Vector3};
use parking_lot::Mutex;
use tracing::info;

use slampub::engine::{FrameSource, MapPoint, MapPointId, MapView, TrajectorySource};
use slampub::geometry::{RigidTransform, IMAGE_FRAME};
use slampub::io::PublisherSettings;
use slampub::publisher::messages::{now_ns, FrameImage};
use slampub::publisher::SlamDataPublisher;
use slampub::viz::RerunSink;

/// Radius of the synthetic drive, meters.
const DRIVE_RADIUS: f64 = 5.0;
/// Heading increment per frame, radians.
const STEP_ANGLE: f64 = 0.01;
/// Frames to simulate before finishing.
const DEMO_FRAMES: usize = 1500;
/// How many of the newest points count as the local tracking window.
const REFERENCE_WINDOW: usize = 40;

struct EngineState {
    step: usize,
    trajectory: Vec<RigidTransform>,
    map_points: Vec<MapPoint>,
}

/// Synthetic engine: camera on a circle in the native X/Z plane, map
/// points scattered around each pose.
struct SyntheticEngine {
    state: Mutex<EngineState>,
    image_width: u32,
    image_height: u32,
}

impl SyntheticEngine {
    fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            state: Mutex::new(EngineState {
                step: 0,
                trajectory: Vec::new(),
                map_points: Vec::new(),
            }),
            image_width,
            image_height,
        }
    }

    /// Advance one frame; returns the live world→camera estimate for the
    /// pose store.
    fn advance(&self) -> RigidTransform {
        let mut state = self.state.lock();
        state.step += 1;
        let theta = state.step as f64 * STEP_ANGLE;

        // Camera→world: yaw about the native down axis, circular position.
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), theta).into_inner();
        let translation = Vector3::new(
            DRIVE_RADIUS * (1.0 - theta.cos()),
            0.0,
            DRIVE_RADIUS * theta.sin(),
        );
        let t_world_cam = RigidTransform::from_rotation_translation(rotation, translation);
        state.trajectory.push(t_world_cam);

        // Scatter a few landmarks around the new pose, deterministically.
        let base = state.map_points.len() as u64;
        for i in 0..3u64 {
            let phase = (base + i) as f64;
            let offset = Vector3::new(
                2.0 * (phase * 0.7).sin(),
                1.0 * (phase * 1.3).cos(),
                4.0 + 2.0 * (phase * 0.4).sin(),
            );
            state.map_points.push(MapPoint::new(
                MapPointId::new(base + i),
                translation + rotation * offset,
            ));
        }

        t_world_cam.inverse()
    }
}

impl TrajectorySource for SyntheticEngine {
    fn current_trajectory(&self) -> Vec<RigidTransform> {
        self.state.lock().trajectory.clone()
    }
}

impl MapView for SyntheticEngine {
    fn all_map_points(&self) -> Vec<MapPoint> {
        self.state.lock().map_points.clone()
    }

    fn reference_map_points(&self) -> Vec<MapPoint> {
        let state = self.state.lock();
        let start = state.map_points.len().saturating_sub(REFERENCE_WINDOW);
        state.map_points[start..].to_vec()
    }
}

impl FrameSource for SyntheticEngine {
    fn draw_frame(&self) -> Option<FrameImage> {
        let step = {
            let state = self.state.lock();
            if state.step == 0 {
                return None;
            }
            state.step
        };

        // Procedural overlay: a horizon gradient with a sweeping stripe.
        let (w, h) = (self.image_width, self.image_height);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        let stripe = (step as u32 * 4) % w;
        for y in 0..h {
            let shade = (y * 255 / h.max(1)) as u8;
            for x in 0..w {
                if x.abs_diff(stripe) < 4 {
                    data.extend_from_slice(&[255, 64, 64]);
                } else {
                    data.extend_from_slice(&[shade, shade, 96]);
                }
            }
        }

        Some(FrameImage {
            frame_id: IMAGE_FRAME,
            timestamp_ns: now_ns(),
            width: w,
            height: h,
            data,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => PublisherSettings::from_yaml_file(&path)?,
        None => PublisherSettings::default(),
    };
    let frame_interval = settings.frame_interval();
    info!(
        fps = settings.camera_fps,
        width = settings.image_width,
        height = settings.image_height,
        "starting synthetic drive"
    );

    let engine = Arc::new(SyntheticEngine::new(
        settings.image_width as u32,
        settings.image_height as u32,
    ));
    let sink = Arc::new(RerunSink::new("slampub_demo")?);

    let publisher = Arc::new(SlamDataPublisher::new(
        &settings,
        Arc::clone(&engine) as Arc<dyn TrajectorySource>,
        Arc::clone(&engine) as Arc<dyn MapView>,
        Arc::clone(&engine) as Arc<dyn FrameSource>,
        sink,
    ));
    let store = publisher.store();
    let lifecycle = publisher.lifecycle();

    let runner = thread::spawn({
        let publisher = Arc::clone(&publisher);
        move || {
            let overlay = publisher.run();
            let _ = overlay.join();
        }
    });

    // Producer: push a fresh estimate once per frame interval.
    for frame in 0..DEMO_FRAMES {
        let t_cam_world = engine.advance();
        store.set_camera_pose(&t_cam_world);
        if frame % 300 == 0 {
            info!(frame, "drive progress");
        }
        thread::sleep(frame_interval);
    }

    lifecycle.request_finish();
    let _ = runner.join();
    info!(finished = lifecycle.is_finished(), "demo complete");

    Ok(())
}
