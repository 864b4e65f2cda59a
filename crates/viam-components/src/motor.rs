//! [`MotorClient`] – drives a motor by power, RPM or revolutions.
//!
//! Power is a signed fraction in `[-1.0, 1.0]`; positions are in
//! revolutions from the motor's zero point.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.motor.v1.MotorService",
    &[
        "SetPower",
        "GoFor",
        "GoTo",
        "SetRPM",
        "ResetZeroPosition",
        "GetPosition",
        "GetProperties",
        "Stop",
        "IsPowered",
        "IsMoving",
        "DoCommand",
        "GetGeometries",
    ],
);

/// Features the motor supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotorProperties {
    /// Whether `get_position` reports a meaningful value.
    pub position_reporting: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PositionResponse {
    #[serde(with = "wire::double")]
    position: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IsPoweredResponse {
    is_on: bool,
    #[serde(with = "wire::double")]
    power_pct: f64,
}

viam_rpc::resource_adapter! {
    /// Client for a single motor.
    pub struct MotorClient => SERVICE;
}

impl MotorClient {
    /// Set the power as a fraction of full power, `-1.0..=1.0`.
    pub async fn set_power(&self, power_pct: f64, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "powerPct": power_pct,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetPower", request).await
    }

    /// Spin `revolutions` at `rpm`. The call returns when the motion ends.
    pub async fn go_for(
        &self,
        rpm: f64,
        revolutions: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "rpm": rpm,
            "revolutions": revolutions,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("GoFor", request).await
    }

    /// Move to an absolute position (revolutions from zero) at `rpm`.
    pub async fn go_to(
        &self,
        rpm: f64,
        position_revolutions: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "rpm": rpm,
            "positionRevolutions": position_revolutions,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("GoTo", request).await
    }

    /// Spin at `rpm` until stopped.
    pub async fn set_rpm(&self, rpm: f64, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "rpm": rpm, "extra": wire::extra(extra) });
        self.inner.call_empty("SetRPM", request).await
    }

    /// Make the current position read as `offset` revolutions.
    pub async fn reset_zero_position(
        &self,
        offset: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "offset": offset, "extra": wire::extra(extra) });
        self.inner.call_empty("ResetZeroPosition", request).await
    }

    /// Current position in revolutions from zero.
    pub async fn get_position(&self, extra: Option<Struct>) -> Result<f64, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: PositionResponse = self.inner.call("GetPosition", request).await?;
        Ok(resp.position)
    }

    pub async fn get_properties(&self, extra: Option<Struct>) -> Result<MotorProperties, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call("GetProperties", request).await
    }

    /// Whether the motor is powered, and at what fraction of full power.
    pub async fn is_powered(&self, extra: Option<Struct>) -> Result<(bool, f64), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: IsPoweredResponse = self.inner.call("IsPowered", request).await?;
        Ok((resp.is_on, resp.power_pct))
    }

    pub async fn is_moving(&self) -> Result<bool, ViamError> {
        shared::is_moving(&self.inner).await
    }

    pub async fn stop(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        shared::stop(&self.inner, extra).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
