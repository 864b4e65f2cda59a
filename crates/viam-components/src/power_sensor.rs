//! [`PowerSensorClient`] – voltage, current and power measurements.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Readings, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.powersensor.v1.PowerSensorService",
    &["GetVoltage", "GetCurrent", "GetPower", "GetReadings", "DoCommand"],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VoltageResponse {
    #[serde(with = "wire::double")]
    volts: f64,
    is_ac: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CurrentResponse {
    #[serde(with = "wire::double")]
    amperes: f64,
    is_ac: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PowerResponse {
    #[serde(with = "wire::double")]
    watts: f64,
}

viam_rpc::resource_adapter! {
    /// Client for a single power sensor.
    pub struct PowerSensorClient => SERVICE;
}

impl PowerSensorClient {
    /// Volts, and whether the measurement is AC.
    pub async fn get_voltage(&self, extra: Option<Struct>) -> Result<(f64, bool), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: VoltageResponse = self.inner.call("GetVoltage", request).await?;
        Ok((resp.volts, resp.is_ac))
    }

    /// Amperes, and whether the measurement is AC.
    pub async fn get_current(&self, extra: Option<Struct>) -> Result<(f64, bool), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: CurrentResponse = self.inner.call("GetCurrent", request).await?;
        Ok((resp.amperes, resp.is_ac))
    }

    pub async fn get_power(&self, extra: Option<Struct>) -> Result<f64, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: PowerResponse = self.inner.call("GetPower", request).await?;
        Ok(resp.watts)
    }

    pub async fn get_readings(&self, extra: Option<Struct>) -> Result<Readings, ViamError> {
        shared::get_readings(&self.inner, extra).await
    }
}
