//! Ground-referenced publishing: shared pose state, projection,
//! classification, lifecycle and the periodic loops.

pub mod data_pub;
pub mod lifecycle;
pub mod messages;
pub mod point_cloud;
pub mod sink;
pub mod trajectory;
pub mod transform_store;

pub use data_pub::SlamDataPublisher;
pub use lifecycle::LifecycleController;
pub use point_cloud::PointCloudClassifier;
pub use sink::{ChannelSink, DataSink, SinkReceivers};
pub use trajectory::TrajectoryProjector;
pub use transform_store::FrameTransformStore;
