//! [`ArmClient`] – robotic arm with end-effector and joint control.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Kinematics, Pose, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.arm.v1.ArmService",
    &[
        "GetEndPosition",
        "MoveToPosition",
        "GetJointPositions",
        "MoveToJointPositions",
        "Stop",
        "IsMoving",
        "DoCommand",
        "GetKinematics",
        "GetGeometries",
    ],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndPositionResponse {
    pose: Pose,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JointPositions {
    #[serde(with = "wire::double_vec")]
    values: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JointPositionsResponse {
    positions: JointPositions,
}

viam_rpc::resource_adapter! {
    /// Client for a single arm.
    pub struct ArmClient => SERVICE;
}

impl ArmClient {
    /// Pose of the end effector relative to the arm's base.
    pub async fn get_end_position(&self, extra: Option<Struct>) -> Result<Pose, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: EndPositionResponse = self.inner.call("GetEndPosition", request).await?;
        Ok(resp.pose)
    }

    pub async fn move_to_position(&self, pose: Pose, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "to": pose, "extra": wire::extra(extra) });
        self.inner.call_empty("MoveToPosition", request).await
    }

    /// Joint positions in degrees, one per joint, base first.
    pub async fn get_joint_positions(&self, extra: Option<Struct>) -> Result<Vec<f64>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: JointPositionsResponse = self.inner.call("GetJointPositions", request).await?;
        Ok(resp.positions.values)
    }

    pub async fn move_to_joint_positions(
        &self,
        positions: Vec<f64>,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "positions": { "values": positions },
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("MoveToJointPositions", request).await
    }

    pub async fn stop(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        shared::stop(&self.inner, extra).await
    }

    pub async fn is_moving(&self) -> Result<bool, ViamError> {
        shared::is_moving(&self.inner).await
    }

    /// The kinematic model (SVA or URDF document) describing the arm.
    pub async fn get_kinematics(&self, extra: Option<Struct>) -> Result<Kinematics, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call("GetKinematics", request).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
