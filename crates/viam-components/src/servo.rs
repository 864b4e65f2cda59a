//! [`ServoClient`] – angular position servo.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.servo.v1.ServoService",
    &["Move", "GetPosition", "Stop", "IsMoving", "DoCommand", "GetGeometries"],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PositionResponse {
    position_deg: u32,
}

viam_rpc::resource_adapter! {
    /// Client for a single servo.
    pub struct ServoClient => SERVICE;
}

impl ServoClient {
    pub async fn move_to(&self, angle_deg: u32, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "angleDeg": angle_deg, "extra": wire::extra(extra) });
        self.inner.call_empty("Move", request).await
    }

    pub async fn get_position(&self, extra: Option<Struct>) -> Result<u32, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: PositionResponse = self.inner.call("GetPosition", request).await?;
        Ok(resp.position_deg)
    }

    pub async fn stop(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        shared::stop(&self.inner, extra).await
    }

    pub async fn is_moving(&self) -> Result<bool, ViamError> {
        shared::is_moving(&self.inner).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
