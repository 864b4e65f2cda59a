//! Messages shared across component and service schemas.
//!
//! Field names follow the JSON mapping of the remote schema
//! (`o_x` → `"oX"`, `reference_frame` → `"referenceFrame"`). Every struct
//! deserializes with `default` because proto3 JSON omits zero values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire;

/// Sensor readings keyed by reading name.
pub type Readings = HashMap<String, Value>;

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    #[serde(with = "wire::double")]
    pub x: f64,
    #[serde(with = "wire::double")]
    pub y: f64,
    #[serde(with = "wire::double")]
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A 6DoF pose: position in millimetres plus an orientation vector
/// (`o_x`, `o_y`, `o_z`) and a rotation `theta` in degrees about it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pose {
    #[serde(with = "wire::double")]
    pub x: f64,
    #[serde(with = "wire::double")]
    pub y: f64,
    #[serde(with = "wire::double")]
    pub z: f64,
    #[serde(with = "wire::double")]
    pub o_x: f64,
    #[serde(with = "wire::double")]
    pub o_y: f64,
    #[serde(with = "wire::double")]
    pub o_z: f64,
    #[serde(with = "wire::double")]
    pub theta: f64,
}

/// An orientation vector without a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Orientation {
    #[serde(with = "wire::double")]
    pub o_x: f64,
    #[serde(with = "wire::double")]
    pub o_y: f64,
    #[serde(with = "wire::double")]
    pub o_z: f64,
    #[serde(with = "wire::double")]
    pub theta: f64,
}

/// A pose expressed relative to a named reference frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoseInFrame {
    pub reference_frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<Pose>,
}

impl PoseInFrame {
    pub fn new(reference_frame: impl Into<String>, pose: Pose) -> Self {
        Self {
            reference_frame: reference_frame.into(),
            pose: Some(pose),
        }
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    #[serde(with = "wire::double")]
    pub latitude: f64,
    #[serde(with = "wire::double")]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Fully-qualified identity of a resource on a machine. Orders by
/// namespace, type, subtype, then name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceName {
    pub namespace: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    pub name: String,
}

impl ResourceName {
    /// Name of a built-in component, e.g. `ResourceName::component("motor", "left")`.
    pub fn component(subtype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: "rdk".to_string(),
            kind: "component".to_string(),
            subtype: subtype.into(),
            name: name.into(),
        }
    }

    /// Name of a built-in service, e.g. `ResourceName::service("slam", "map")`.
    pub fn service(subtype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: "rdk".to_string(),
            kind: "service".to_string(),
            subtype: subtype.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}/{}",
            self.namespace, self.kind, self.subtype, self.name
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sphere {
    #[serde(with = "wire::double")]
    pub radius_mm: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RectangularPrism {
    pub dims_mm: Vector3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capsule {
    #[serde(with = "wire::double")]
    pub radius_mm: f64,
    #[serde(with = "wire::double")]
    pub length_mm: f64,
}

/// A collision volume centred on `center`. At most one shape is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Pose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sphere: Option<Sphere>,
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    pub prism: Option<RectangularPrism>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule: Option<Capsule>,
    pub label: String,
}

/// Geometries anchored at a geographic location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoGeometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub geometries: Vec<Geometry>,
}

/// Geometries expressed in a named frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometriesInFrame {
    pub reference_frame: String,
    pub geometries: Vec<Geometry>,
}

/// A supplemental frame added to the frame system for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transform {
    pub reference_frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose_in_observer_frame: Option<PoseInFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_object: Option<Geometry>,
}

/// Obstacles and transforms the planner should account for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldState {
    pub obstacles: Vec<GeometriesInFrame>,
    pub transforms: Vec<Transform>,
}

/// File format of a kinematics description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KinematicsFormat {
    #[default]
    #[serde(rename = "KINEMATICS_FILE_FORMAT_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "KINEMATICS_FILE_FORMAT_SVA")]
    Sva,
    #[serde(rename = "KINEMATICS_FILE_FORMAT_URDF")]
    Urdf,
}

/// A kinematics description as returned by `GetKinematics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Kinematics {
    pub format: KinematicsFormat,
    #[serde(with = "wire::base64_bytes")]
    pub kinematics_data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pose_uses_camel_case_orientation_fields() {
        let pose = Pose {
            x: 1.0,
            o_z: 1.0,
            theta: 90.0,
            ..Default::default()
        };
        let value = serde_json::to_value(pose).unwrap();
        assert_eq!(value["oZ"], json!(1.0));
        assert_eq!(value["theta"], json!(90.0));
    }

    #[test]
    fn resource_name_type_field() {
        let name = ResourceName::component("motor", "left");
        let value = serde_json::to_value(&name).unwrap();
        assert_eq!(value["type"], json!("component"));
        assert_eq!(name.to_string(), "rdk:component:motor/left");
    }

    #[test]
    fn geometry_box_field_name() {
        let geometry = Geometry {
            prism: Some(RectangularPrism {
                dims_mm: Vector3::new(10.0, 20.0, 30.0),
            }),
            label: "crate".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["box"]["dimsMm"]["y"], json!(20.0));
        assert!(value.get("sphere").is_none());
    }

    #[test]
    fn kinematics_decodes_enum_and_bytes() {
        let k: Kinematics = serde_json::from_value(json!({
            "format": "KINEMATICS_FILE_FORMAT_URDF",
            "kinematicsData": "PHJvYm90Lz4="
        }))
        .unwrap();
        assert_eq!(k.format, KinematicsFormat::Urdf);
        assert_eq!(k.kinematics_data, b"<robot/>");
    }

    #[test]
    fn empty_object_decodes_to_defaults() {
        let pif: PoseInFrame = serde_json::from_value(json!({})).unwrap();
        assert_eq!(pif.reference_frame, "");
        assert!(pif.pose.is_none());
    }
}
