//! [`GripperClient`] – open/close end effector.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.gripper.v1.GripperService",
    &["Open", "Grab", "Stop", "IsMoving", "DoCommand", "GetGeometries"],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GrabResponse {
    success: bool,
}

viam_rpc::resource_adapter! {
    /// Client for a single gripper.
    pub struct GripperClient => SERVICE;
}

impl GripperClient {
    pub async fn open(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call_empty("Open", request).await
    }

    /// Close until something is held. Returns whether an object was grabbed.
    pub async fn grab(&self, extra: Option<Struct>) -> Result<bool, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: GrabResponse = self.inner.call("Grab", request).await?;
        Ok(resp.success)
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
