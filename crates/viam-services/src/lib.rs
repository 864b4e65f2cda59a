//! `viam-services` – typed clients for machine services.
//!
//! # Modules
//!
//! - [`motion`] – motion planning: blocking moves and tracked executions on
//!   a SLAM map or on the globe.
//! - [`navigation`] – waypoint navigation, with local checks on reported
//!   locations.
//! - [`slam`] – pose, map and internal-state downloads.
//! - [`vision`] – detections, classifications and object point clouds.
//! - [`data_manager`] – on-demand sync of captured data.
//! - [`generic`] – services reachable only through `do_command`.
//! - [`robot`] – the machine itself: resource discovery, operations, frame
//!   system, status.

pub mod data_manager;
pub mod generic;
pub mod motion;
pub mod navigation;
pub mod robot;
pub mod slam;
pub mod vision;

pub use data_manager::DataManagerClient;
pub use generic::GenericServiceClient;
pub use motion::{
    Constraints, MotionClient, MotionConfiguration, PlanHistory, PlanState, PlanStatus, PlanStatusWithId,
};
pub use navigation::{GeoLocation, MapType, Mode, NavigationClient, Path, Waypoint};
pub use robot::{MachineStatus, Operation, RobotClient};
pub use slam::{SlamClient, SlamProperties};
pub use vision::{
    CaptureAllResult, CaptureOptions, Classification, Detection, PointCloudObject, VisionClient,
    VisionProperties,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use viam_rpc::MockChannel;

    pub fn mock() -> Arc<MockChannel> {
        Arc::new(MockChannel::new())
    }
}
