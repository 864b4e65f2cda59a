//! `viam-types` – shared wire types and the workspace error.
//!
//! Every adapter crate speaks in terms of the values defined here:
//!
//! - [`common`] – geometry and identity messages shared by many services
//!   ([`Pose`], [`Vector3`], [`GeoPoint`], [`ResourceName`], ...).
//! - [`wire`] – helpers for the proto3 canonical JSON mapping (int64 fields
//!   travel as strings, bytes as base64, `extra` as a plain object).
//! - [`ViamError`] – the single error type returned by every adapter call.

use thiserror::Error;

pub mod common;
pub mod wire;

pub use common::{
    Capsule, GeoGeometry, GeoPoint, GeometriesInFrame, Geometry, Kinematics, KinematicsFormat, Orientation, Pose,
    PoseInFrame, Readings, RectangularPrism, ResourceName, Sphere, Transform, Vector3, WorldState,
};

/// Free-form key/value document (`google.protobuf.Struct`).
///
/// Used for the `extra` bag on every request and for `do_command`
/// payloads. Opaque to the SDK.
pub type Struct = serde_json::Map<String, serde_json::Value>;

/// Error type spanning transport failures, remote rejections and the few
/// local checks adapters perform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViamError {
    /// The channel could not deliver the request or read the response.
    #[error("Transport Error: {0}")]
    Transport(String),

    /// The remote endpoint answered with an application-level error.
    #[error("Remote Error [{code}]: {message}")]
    Remote { code: String, message: String },

    /// A request or response could not be encoded / decoded.
    #[error("Serialization Error: {0}")]
    Serialization(String),

    /// A navigation response arrived without a location.
    #[error("no location")]
    NoLocation,

    /// A navigation response carried a location that is not a usable
    /// coordinate pair.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// The caller supplied arguments that cannot form a valid request.
    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    /// The method is not part of the service's method table.
    #[error("Unknown Method: {service}/{method}")]
    UnknownMethod { service: String, method: String },

    /// A streaming call was stopped through its cancel handle.
    #[error("stream cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for ViamError {
    fn from(e: serde_json::Error) -> Self {
        ViamError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viam_error_display() {
        let err = ViamError::Remote {
            code: "not_found".to_string(),
            message: "resource motor-2 not found".to_string(),
        };
        assert!(err.to_string().contains("not_found"));
        assert!(err.to_string().contains("motor-2"));

        assert_eq!(ViamError::NoLocation.to_string(), "no location");
        assert!(
            ViamError::InvalidLocation("latitude is NaN".into())
                .to_string()
                .starts_with("invalid location")
        );
    }

    #[test]
    fn serde_json_error_converts_to_serialization() {
        let bad = serde_json::from_str::<Pose>("{\"x\": \"north\"}").unwrap_err();
        let err: ViamError = bad.into();
        assert!(matches!(err, ViamError::Serialization(_)));
    }
}
