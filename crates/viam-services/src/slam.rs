//! [`SlamClient`] – localisation and mapping.
//!
//! The map and the algorithm's internal state are large binary artefacts
//! delivered as a server stream of base64 chunks; both calls concatenate
//! the chunks in arrival order and return the whole buffer.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::{CancelToken, ServiceDescriptor, concat_bytes};
use viam_types::{Pose, ViamError};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.service.slam.v1.SLAMService",
    &[
        "GetPosition",
        "GetPointCloudMap",
        "GetInternalState",
        "GetProperties",
        "DoCommand",
    ],
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MappingMode {
    #[default]
    #[serde(rename = "MAPPING_MODE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "MAPPING_MODE_CREATE_NEW_MAP")]
    CreateNewMap,
    #[serde(rename = "MAPPING_MODE_LOCALIZE_ONLY")]
    LocalizeOnly,
    #[serde(rename = "MAPPING_MODE_UPDATE_EXISTING_MAP")]
    UpdateExistingMap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SensorType {
    #[default]
    #[serde(rename = "SENSOR_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "SENSOR_TYPE_CAMERA")]
    Camera,
    #[serde(rename = "SENSOR_TYPE_MOVEMENT_SENSOR")]
    MovementSensor,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SensorType,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlamProperties {
    pub cloud_slam: bool,
    pub mapping_mode: MappingMode,
    pub internal_state_file_type: Option<String>,
    pub sensor_info: Vec<SensorInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PositionResponse {
    pose: Pose,
    component_reference: String,
}

viam_rpc::resource_adapter! {
    /// Client for a single SLAM service.
    pub struct SlamClient => SERVICE;
}

impl SlamClient {
    /// Current pose on the map, and the name of the component it refers to.
    pub async fn get_position(&self) -> Result<(Pose, String), ViamError> {
        let resp: PositionResponse = self
            .inner
            .call("GetPosition", json!({ "name": self.name() }))
            .await?;
        Ok((resp.pose, resp.component_reference))
    }

    /// The map as a PCD file.
    ///
    /// # Errors
    ///
    /// [`ViamError::Cancelled`] if `cancel` fires before the last chunk;
    /// stream failures unchanged.
    pub async fn get_point_cloud_map(
        &self,
        return_edited_map: bool,
        cancel: Option<CancelToken>,
    ) -> Result<Vec<u8>, ViamError> {
        let request = json!({ "name": self.name(), "returnEditedMap": return_edited_map });
        let stream = self.inner.stream("GetPointCloudMap", request).await?;
        concat_bytes(stream, "pointCloudPcdChunk", cancel).await
    }

    /// The SLAM algorithm's serialised internal state.
    pub async fn get_internal_state(&self, cancel: Option<CancelToken>) -> Result<Vec<u8>, ViamError> {
        let stream = self
            .inner
            .stream("GetInternalState", json!({ "name": self.name() }))
            .await?;
        concat_bytes(stream, "internalStateChunk", cancel).await
    }

    pub async fn get_properties(&self) -> Result<SlamProperties, ViamError> {
        self.inner
            .call("GetProperties", json!({ "name": self.name() }))
            .await
    }
}
