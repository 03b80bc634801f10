//! Geometry utilities: rigid transforms and coordinate frame conventions.

pub mod frames;
pub mod rigid;

pub use frames::{MountCalibration, GROUND_FRAME, IMAGE_FRAME, VEHICLE_FRAME};
pub use rigid::RigidTransform;
