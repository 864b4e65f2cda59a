//! [`VisionClient`] – detections, classifications and segmented point
//! clouds, from a named camera or from caller-supplied image bytes.

use serde::{Deserialize, Serialize};
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{GeometriesInFrame, Struct, ViamError, wire};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.service.vision.v1.VisionService",
    &[
        "GetDetectionsFromCamera",
        "GetDetections",
        "GetClassificationsFromCamera",
        "GetClassifications",
        "GetObjectPointClouds",
        "CaptureAllFromCamera",
        "GetProperties",
        "DoCommand",
    ],
);

/// A bounding box with a label. Pixel corners are absent when the model
/// only reports normalised coordinates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Detection {
    #[serde(with = "opt_int64")]
    pub x_min: Option<i64>,
    #[serde(with = "opt_int64")]
    pub y_min: Option<i64>,
    #[serde(with = "opt_int64")]
    pub x_max: Option<i64>,
    #[serde(with = "opt_int64")]
    pub y_max: Option<i64>,
    #[serde(with = "wire::double")]
    pub confidence: f64,
    pub class_name: String,
    #[serde(with = "wire::opt_double")]
    pub x_min_normalized: Option<f64>,
    #[serde(with = "wire::opt_double")]
    pub y_min_normalized: Option<f64>,
    #[serde(with = "wire::opt_double")]
    pub x_max_normalized: Option<f64>,
    #[serde(with = "wire::opt_double")]
    pub y_max_normalized: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Classification {
    pub class_name: String,
    #[serde(with = "wire::double")]
    pub confidence: f64,
}

/// One segmented object: its points and the geometries bounding it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointCloudObject {
    #[serde(with = "wire::base64_bytes")]
    pub point_cloud: Vec<u8>,
    pub geometries: Option<GeometriesInFrame>,
}

/// An image returned by `capture_all_from_camera`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Image {
    pub source_name: String,
    pub mime_type: String,
    #[serde(with = "wire::base64_bytes")]
    pub image: Vec<u8>,
}

/// Which results `capture_all_from_camera` should compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    pub return_image: bool,
    pub return_classifications: bool,
    pub return_detections: bool,
    pub return_object_point_clouds: bool,
}

impl CaptureOptions {
    pub fn all() -> Self {
        Self {
            return_image: true,
            return_classifications: true,
            return_detections: true,
            return_object_point_clouds: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureAllResult {
    pub image: Option<Image>,
    pub detections: Vec<Detection>,
    pub classifications: Vec<Classification>,
    pub objects: Vec<PointCloudObject>,
    pub extra: Option<Struct>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisionProperties {
    pub classifications_supported: bool,
    pub detections_supported: bool,
    pub object_point_clouds_supported: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetectionsResponse {
    detections: Vec<Detection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClassificationsResponse {
    classifications: Vec<Classification>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectsResponse {
    objects: Vec<PointCloudObject>,
}

viam_rpc::resource_adapter! {
    /// Client for a single vision service.
    pub struct VisionClient => SERVICE;
}

impl VisionClient {
    pub async fn get_detections_from_camera(
        &self,
        camera: &str,
        extra: Option<Struct>,
    ) -> Result<Vec<Detection>, ViamError> {
        let request = json!({ "name": self.name(), "cameraName": camera, "extra": wire::extra(extra) });
        let resp: DetectionsResponse = self.inner.call("GetDetectionsFromCamera", request).await?;
        Ok(resp.detections)
    }

    /// Detect objects in an encoded image of `width` × `height` pixels.
    pub async fn get_detections(
        &self,
        image: &[u8],
        width: i64,
        height: i64,
        mime_type: &str,
        extra: Option<Struct>,
    ) -> Result<Vec<Detection>, ViamError> {
        let request = json!({
            "name": self.name(),
            "image": wire::encode_bytes(image),
            "width": width.to_string(),
            "height": height.to_string(),
            "mimeType": mime_type,
            "extra": wire::extra(extra),
        });
        let resp: DetectionsResponse = self.inner.call("GetDetections", request).await?;
        Ok(resp.detections)
    }

    /// The top `n` classifications of the camera's current frame.
    pub async fn get_classifications_from_camera(
        &self,
        camera: &str,
        n: i32,
        extra: Option<Struct>,
    ) -> Result<Vec<Classification>, ViamError> {
        let request = json!({
            "name": self.name(),
            "cameraName": camera,
            "n": n,
            "extra": wire::extra(extra),
        });
        let resp: ClassificationsResponse =
            self.inner.call("GetClassificationsFromCamera", request).await?;
        Ok(resp.classifications)
    }

    pub async fn get_classifications(
        &self,
        image: &[u8],
        width: i32,
        height: i32,
        mime_type: &str,
        n: i32,
        extra: Option<Struct>,
    ) -> Result<Vec<Classification>, ViamError> {
        let request = json!({
            "name": self.name(),
            "image": wire::encode_bytes(image),
            "width": width,
            "height": height,
            "mimeType": mime_type,
            "n": n,
            "extra": wire::extra(extra),
        });
        let resp: ClassificationsResponse = self.inner.call("GetClassifications", request).await?;
        Ok(resp.classifications)
    }

    pub async fn get_object_point_clouds(
        &self,
        camera: &str,
        mime_type: &str,
        extra: Option<Struct>,
    ) -> Result<Vec<PointCloudObject>, ViamError> {
        let request = json!({
            "name": self.name(),
            "cameraName": camera,
            "mimeType": mime_type,
            "extra": wire::extra(extra),
        });
        let resp: ObjectsResponse = self.inner.call("GetObjectPointClouds", request).await?;
        Ok(resp.objects)
    }

    /// One frame from `camera` plus whichever results `options` selects,
    /// computed on that same frame.
    pub async fn capture_all_from_camera(
        &self,
        camera: &str,
        options: CaptureOptions,
        extra: Option<Struct>,
    ) -> Result<CaptureAllResult, ViamError> {
        let mut request = json!({
            "name": self.name(),
            "cameraName": camera,
            "extra": wire::extra(extra),
        });
        if let (Some(fields), serde_json::Value::Object(flags)) = (request.as_object_mut(), json!(options)) {
            fields.extend(flags);
        }
        self.inner.call("CaptureAllFromCamera", request).await
    }

    pub async fn get_properties(&self, extra: Option<Struct>) -> Result<VisionProperties, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call("GetProperties", request).await
    }
}

/// `optional int64`: absent stays `None`, present may be string or number.
mod opt_int64 {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("{n} is not an int64"))),
            Some(Value::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
            Some(other) => Err(serde::de::Error::custom(format!("{other} is not an int64"))),
        }
    }
}
