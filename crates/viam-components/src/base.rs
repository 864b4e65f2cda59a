//! [`BaseClient`] – a mobile base (wheeled, tracked, legged).
//!
//! Linear and angular vectors follow the right-handed body frame: `y` is
//! forward, `z` is up. `set_power` takes fractions of full power;
//! `set_velocity` takes mm/s and deg/s.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, Vector3, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.base.v1.BaseService",
    &[
        "MoveStraight",
        "Spin",
        "SetPower",
        "SetVelocity",
        "Stop",
        "IsMoving",
        "DoCommand",
        "GetGeometries",
        "GetProperties",
    ],
);

/// Physical dimensions of the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseProperties {
    #[serde(with = "wire::double")]
    pub width_meters: f64,
    #[serde(with = "wire::double")]
    pub turning_radius_meters: f64,
    #[serde(with = "wire::double")]
    pub wheel_circumference_meters: f64,
}

viam_rpc::resource_adapter! {
    /// Client for a single base.
    pub struct BaseClient => SERVICE;
}

impl BaseClient {
    /// Drive `distance_mm` (negative is backwards) at `mm_per_sec`.
    pub async fn move_straight(
        &self,
        distance_mm: i64,
        mm_per_sec: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "distanceMm": distance_mm.to_string(),
            "mmPerSec": mm_per_sec,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("MoveStraight", request).await
    }

    /// Turn in place by `angle_deg` (positive is counter-clockwise).
    pub async fn spin(
        &self,
        angle_deg: f64,
        degs_per_sec: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "angleDeg": angle_deg,
            "degsPerSec": degs_per_sec,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("Spin", request).await
    }

    pub async fn set_power(
        &self,
        linear: Vector3,
        angular: Vector3,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "linear": linear,
            "angular": angular,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetPower", request).await
    }

    pub async fn set_velocity(
        &self,
        linear: Vector3,
        angular: Vector3,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "linear": linear,
            "angular": angular,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetVelocity", request).await
    }

    pub async fn stop(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        shared::stop(&self.inner, extra).await
    }

    pub async fn is_moving(&self) -> Result<bool, ViamError> {
        shared::is_moving(&self.inner).await
    }

    pub async fn get_properties(&self, extra: Option<Struct>) -> Result<BaseProperties, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call("GetProperties", request).await
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
    async fn move_straight_encodes_distance_as_int64_string() {
        let mock = mock();
        let base = BaseClient::new(mock.clone(), "rover", ClientOptions::default());

        base.move_straight(-300, 150.0, None).await.unwrap();

        assert_eq!(
            mock.last_request(),
            Some(json!({
                "name": "rover",
                "distanceMm": "-300",
                "mmPerSec": 150.0,
                "extra": {},
            }))
        );
    }

    #[tokio::test]
    async fn set_velocity_sends_both_vectors() {
        let mock = mock();
        let base = BaseClient::new(mock.clone(), "rover", ClientOptions::default());

        base.set_velocity(Vector3::new(0.0, 200.0, 0.0), Vector3::new(0.0, 0.0, 30.0), None)
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request["linear"], json!({ "x": 0.0, "y": 200.0, "z": 0.0 }));
        assert_eq!(request["angular"]["z"], json!(30.0));
    }

    #[tokio::test]
    async fn properties_are_projected() {
        let mock = mock();
        mock.respond(
            "/viam.component.base.v1.BaseService/GetProperties",
            json!({ "widthMeters": 0.4, "turningRadiusMeters": 0.0, "wheelCircumferenceMeters": 0.22 }),
        );
        let base = BaseClient::new(mock.clone(), "rover", ClientOptions::default());

        let props = base.get_properties(None).await.unwrap();
        assert_eq!(props.width_meters, 0.4);
        assert_eq!(props.wheel_circumference_meters, 0.22);
    }
}
