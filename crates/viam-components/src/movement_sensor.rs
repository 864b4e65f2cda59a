//! [`MovementSensorClient`] – GPS, IMU, odometry and compass readings.
//!
//! Velocities are in mm/s and deg/s, acceleration in mm/s², headings in
//! degrees clockwise from north.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{GeoPoint, Geometry, Orientation, Readings, Struct, Vector3, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.movementsensor.v1.MovementSensorService",
    &[
        "GetLinearVelocity",
        "GetAngularVelocity",
        "GetCompassHeading",
        "GetOrientation",
        "GetPosition",
        "GetProperties",
        "GetAccuracy",
        "GetLinearAcceleration",
        "DoCommand",
        "GetGeometries",
        "GetReadings",
    ],
);

/// Which readings the sensor can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MovementSensorProperties {
    pub linear_velocity_supported: bool,
    pub angular_velocity_supported: bool,
    pub orientation_supported: bool,
    pub position_supported: bool,
    pub compass_heading_supported: bool,
    pub linear_acceleration_supported: bool,
}

/// Accuracy figures. The optional fields are only present for sensors that
/// report them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Accuracy {
    #[serde(with = "wire::float_map")]
    pub accuracy: HashMap<String, f32>,
    #[serde(with = "wire::opt_float")]
    pub position_hdop: Option<f32>,
    #[serde(with = "wire::opt_float")]
    pub position_vdop: Option<f32>,
    pub position_nmea_gga_fix: Option<i32>,
    #[serde(with = "wire::opt_float")]
    pub compass_degrees_error: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LinearVelocityResponse {
    linear_velocity: Vector3,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AngularVelocityResponse {
    angular_velocity: Vector3,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LinearAccelerationResponse {
    linear_acceleration: Vector3,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompassHeadingResponse {
    #[serde(with = "wire::double")]
    value: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrientationResponse {
    orientation: Orientation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PositionResponse {
    coordinate: GeoPoint,
    #[serde(with = "wire::float")]
    altitude_m: f32,
}

viam_rpc::resource_adapter! {
    /// Client for a single movement sensor.
    pub struct MovementSensorClient => SERVICE;
}

impl MovementSensorClient {
    fn request(&self, extra: Option<Struct>) -> serde_json::Value {
        json!({ "name": self.name(), "extra": wire::extra(extra) })
    }

    pub async fn get_linear_velocity(&self, extra: Option<Struct>) -> Result<Vector3, ViamError> {
        let resp: LinearVelocityResponse =
            self.inner.call("GetLinearVelocity", self.request(extra)).await?;
        Ok(resp.linear_velocity)
    }

    pub async fn get_angular_velocity(&self, extra: Option<Struct>) -> Result<Vector3, ViamError> {
        let resp: AngularVelocityResponse =
            self.inner.call("GetAngularVelocity", self.request(extra)).await?;
        Ok(resp.angular_velocity)
    }

    pub async fn get_linear_acceleration(&self, extra: Option<Struct>) -> Result<Vector3, ViamError> {
        let resp: LinearAccelerationResponse =
            self.inner.call("GetLinearAcceleration", self.request(extra)).await?;
        Ok(resp.linear_acceleration)
    }

    pub async fn get_compass_heading(&self, extra: Option<Struct>) -> Result<f64, ViamError> {
        let resp: CompassHeadingResponse =
            self.inner.call("GetCompassHeading", self.request(extra)).await?;
        Ok(resp.value)
    }

    pub async fn get_orientation(&self, extra: Option<Struct>) -> Result<Orientation, ViamError> {
        let resp: OrientationResponse = self.inner.call("GetOrientation", self.request(extra)).await?;
        Ok(resp.orientation)
    }

    /// Current coordinate and altitude in metres.
    pub async fn get_position(&self, extra: Option<Struct>) -> Result<(GeoPoint, f32), ViamError> {
        let resp: PositionResponse = self.inner.call("GetPosition", self.request(extra)).await?;
        Ok((resp.coordinate, resp.altitude_m))
    }

    pub async fn get_properties(&self, extra: Option<Struct>) -> Result<MovementSensorProperties, ViamError> {
        self.inner.call("GetProperties", self.request(extra)).await
    }

    pub async fn get_accuracy(&self, extra: Option<Struct>) -> Result<Accuracy, ViamError> {
        self.inner.call("GetAccuracy", self.request(extra)).await
    }

    pub async fn get_readings(&self, extra: Option<Struct>) -> Result<Readings, ViamError> {
        shared::get_readings(&self.inner, extra).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
