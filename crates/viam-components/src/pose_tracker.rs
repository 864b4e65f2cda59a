//! [`PoseTrackerClient`] – poses of tracked bodies (fiducials, markers).

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, PoseInFrame, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.posetracker.v1.PoseTrackerService",
    &["GetPoses", "DoCommand", "GetGeometries"],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PosesResponse {
    body_poses: HashMap<String, PoseInFrame>,
}

viam_rpc::resource_adapter! {
    /// Client for a single pose tracker.
    pub struct PoseTrackerClient => SERVICE;
}

impl PoseTrackerClient {
    /// Poses of `body_names`, keyed by body. An empty slice asks for every
    /// tracked body.
    pub async fn get_poses(
        &self,
        body_names: &[&str],
        extra: Option<Struct>,
    ) -> Result<HashMap<String, PoseInFrame>, ViamError> {
        let request = json!({
            "name": self.name(),
            "bodyNames": body_names,
            "extra": wire::extra(extra),
        });
        let resp: PosesResponse = self.inner.call("GetPoses", request).await?;
        Ok(resp.body_poses)
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_support::mock;
    use viam_rpc::ClientOptions;

    #[tokio::test]
    async fn poses_are_keyed_by_body() {
        let mock = mock();
        mock.respond(
            "/viam.component.posetracker.v1.PoseTrackerService/GetPoses",
            json!({ "bodyPoses": {
                "tag-3": { "referenceFrame": "cam", "pose": { "x": 1.0, "oZ": 1.0 } }
            }}),
        );
        let tracker = PoseTrackerClient::new(mock.clone(), "tags", ClientOptions::default());

        let poses = tracker.get_poses(&["tag-3"], None).await.unwrap();
        let tag = &poses["tag-3"];
        assert_eq!(tag.reference_frame, "cam");
        assert_eq!(tag.pose.map(|p| p.x), Some(1.0));
        assert_eq!(mock.last_request().unwrap()["bodyNames"], json!(["tag-3"]));
    }
}
