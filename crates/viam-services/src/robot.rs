//! [`RobotClient`] – machine-level calls: resource discovery, operations,
//! frame system and status.
//!
//! The machine is not a named resource, so requests carry no `name` and
//! there is no `do_command`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use viam_rpc::{Channel, ClientOptions, ResourceClient, ServiceDescriptor};
use viam_types::{PoseInFrame, ResourceName, Struct, Transform, ViamError};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.robot.v1.RobotService",
    &[
        "ResourceNames",
        "StopAll",
        "GetOperations",
        "CancelOperation",
        "BlockForOperation",
        "FrameSystemConfig",
        "TransformPose",
        "GetMachineStatus",
    ],
);

/// An in-flight call on the machine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub method: String,
    pub arguments: Option<Struct>,
    pub started: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
}

/// One frame of the machine's frame system.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameSystemConfig {
    pub frame: Transform,
    pub kinematics: Option<Struct>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ResourceState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STATE_UNCONFIGURED")]
    Unconfigured,
    #[serde(rename = "STATE_CONFIGURING")]
    Configuring,
    #[serde(rename = "STATE_READY")]
    Ready,
    #[serde(rename = "STATE_REMOVING")]
    Removing,
    #[serde(rename = "STATE_UNHEALTHY")]
    Unhealthy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MachineState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STATE_INITIALIZING")]
    Initializing,
    #[serde(rename = "STATE_RUNNING")]
    Running,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceStatus {
    pub name: ResourceName,
    pub state: ResourceState,
    pub last_updated: Option<DateTime<Utc>>,
    pub revision: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigStatus {
    pub revision: String,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineStatus {
    pub resources: Vec<ResourceStatus>,
    pub config: ConfigStatus,
    pub state: MachineState,
}

#[derive(Debug, Serialize)]
struct StopExtraParameters<'a> {
    name: &'a ResourceName,
    params: &'a Struct,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceNamesResponse {
    resources: Vec<ResourceName>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OperationsResponse {
    operations: Vec<Operation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FrameSystemConfigResponse {
    frame_system_configs: Vec<FrameSystemConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TransformPoseResponse {
    pose: PoseInFrame,
}

/// Client for the machine itself.
#[derive(Debug, Clone)]
pub struct RobotClient {
    inner: ResourceClient,
}

impl RobotClient {
    /// Performs no I/O.
    pub fn new(channel: Arc<dyn Channel>, options: ClientOptions) -> Self {
        Self {
            inner: ResourceClient::new(channel, &SERVICE, "", options),
        }
    }

    /// Every resource the machine currently serves.
    pub async fn resource_names(&self) -> Result<Vec<ResourceName>, ViamError> {
        let resp: ResourceNamesResponse = self.inner.call("ResourceNames", json!({})).await?;
        Ok(resp.resources)
    }

    /// Stop every actuating resource. `extra` supplies per-resource
    /// parameters for the resources that need them; they are sent sorted by
    /// resource name.
    pub async fn stop_all(&self, extra: &HashMap<ResourceName, Struct>) -> Result<(), ViamError> {
        let mut extra: Vec<StopExtraParameters<'_>> = extra
            .iter()
            .map(|(name, params)| StopExtraParameters { name, params })
            .collect();
        extra.sort_by(|a, b| a.name.cmp(b.name));
        self.inner.call_empty("StopAll", json!({ "extra": extra })).await
    }

    pub async fn get_operations(&self) -> Result<Vec<Operation>, ViamError> {
        let resp: OperationsResponse = self.inner.call("GetOperations", json!({})).await?;
        Ok(resp.operations)
    }

    pub async fn cancel_operation(&self, id: &str) -> Result<(), ViamError> {
        self.inner.call_empty("CancelOperation", json!({ "id": id })).await
    }

    /// Wait until operation `id` has finished.
    pub async fn block_for_operation(&self, id: &str) -> Result<(), ViamError> {
        self.inner.call_empty("BlockForOperation", json!({ "id": id })).await
    }

    pub async fn frame_system_config(
        &self,
        supplemental_transforms: &[Transform],
    ) -> Result<Vec<FrameSystemConfig>, ViamError> {
        let request = json!({ "supplementalTransforms": supplemental_transforms });
        let resp: FrameSystemConfigResponse = self.inner.call("FrameSystemConfig", request).await?;
        Ok(resp.frame_system_configs)
    }

    /// Express `source` in the frame named `destination`.
    pub async fn transform_pose(
        &self,
        source: &PoseInFrame,
        destination: &str,
        supplemental_transforms: &[Transform],
    ) -> Result<PoseInFrame, ViamError> {
        let request = json!({
            "source": source,
            "destination": destination,
            "supplementalTransforms": supplemental_transforms,
        });
        let resp: TransformPoseResponse = self.inner.call("TransformPose", request).await?;
        Ok(resp.pose)
    }

    pub async fn get_machine_status(&self) -> Result<MachineStatus, ViamError> {
        self.inner.call("GetMachineStatus", json!({})).await
    }
}
