//! [`CameraClient`] – frames, multi-source images and point clouds.
//!
//! An empty MIME type lets the camera pick its native format; the returned
//! MIME type always says what was actually sent.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.camera.v1.CameraService",
    &[
        "GetImage",
        "GetImages",
        "RenderFrame",
        "GetPointCloud",
        "GetProperties",
        "DoCommand",
        "GetGeometries",
    ],
);

/// Encoding of an image returned by `get_images`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ImageFormat {
    #[default]
    #[serde(rename = "FORMAT_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "FORMAT_RAW_RGBA")]
    RawRgba,
    #[serde(rename = "FORMAT_RAW_DEPTH")]
    RawDepth,
    #[serde(rename = "FORMAT_JPEG")]
    Jpeg,
    #[serde(rename = "FORMAT_PNG")]
    Png,
}

/// One image from one of the camera's sources.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NamedImage {
    pub source_name: String,
    pub format: ImageFormat,
    pub mime_type: String,
    #[serde(with = "wire::base64_bytes")]
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub captured_at: Option<DateTime<Utc>>,
}

/// Raw HTTP body: a rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpBody {
    pub content_type: String,
    #[serde(with = "wire::base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntrinsicParameters {
    pub width_px: u32,
    pub height_px: u32,
    #[serde(with = "wire::double")]
    pub focal_x_px: f64,
    #[serde(with = "wire::double")]
    pub focal_y_px: f64,
    #[serde(with = "wire::double")]
    pub center_x_px: f64,
    #[serde(with = "wire::double")]
    pub center_y_px: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DistortionParameters {
    pub model: String,
    #[serde(with = "wire::double_vec")]
    pub parameters: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraProperties {
    pub supports_pcd: bool,
    pub intrinsic_parameters: Option<IntrinsicParameters>,
    pub distortion_parameters: Option<DistortionParameters>,
    pub mime_types: Vec<String>,
    #[serde(with = "wire::opt_float")]
    pub frame_rate: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImageResponse {
    mime_type: String,
    #[serde(with = "wire::base64_bytes")]
    image: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImagesResponse {
    images: Vec<NamedImage>,
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PointCloudResponse {
    #[serde(with = "wire::base64_bytes")]
    point_cloud: Vec<u8>,
}

viam_rpc::resource_adapter! {
    /// Client for a single camera.
    pub struct CameraClient => SERVICE;
}

impl CameraClient {
    /// One frame as `(bytes, mime_type)`. Pass `""` to accept any format.
    pub async fn get_image(
        &self,
        mime_type: &str,
        extra: Option<Struct>,
    ) -> Result<(Vec<u8>, String), ViamError> {
        let request = json!({
            "name": self.name(),
            "mimeType": mime_type,
            "extra": wire::extra(extra),
        });
        let resp: ImageResponse = self.inner.call("GetImage", request).await?;
        Ok((resp.image, resp.mime_type))
    }

    /// One synchronised image from every source of the camera.
    pub async fn get_images(
        &self,
        extra: Option<Struct>,
    ) -> Result<(Vec<NamedImage>, ResponseMetadata), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: ImagesResponse = self.inner.call("GetImages", request).await?;
        Ok((resp.images, resp.response_metadata))
    }

    pub async fn render_frame(&self, mime_type: &str, extra: Option<Struct>) -> Result<HttpBody, ViamError> {
        let request = json!({
            "name": self.name(),
            "mimeType": mime_type,
            "extra": wire::extra(extra),
        });
        self.inner.call("RenderFrame", request).await
    }

    /// A point cloud, typically `pointcloud/pcd`.
    pub async fn get_point_cloud(&self, mime_type: &str, extra: Option<Struct>) -> Result<Vec<u8>, ViamError> {
        let request = json!({
            "name": self.name(),
            "mimeType": mime_type,
            "extra": wire::extra(extra),
        });
        let resp: PointCloudResponse = self.inner.call("GetPointCloud", request).await?;
        Ok(resp.point_cloud)
    }

    /// `GetProperties` takes no `extra`.
    pub async fn get_properties(&self) -> Result<CameraProperties, ViamError> {
        self.inner
            .call("GetProperties", json!({ "name": self.name() }))
            .await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
