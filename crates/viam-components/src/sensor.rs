//! [`SensorClient`] – any device that produces named readings.

use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Readings, Struct, ViamError};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.sensor.v1.SensorService",
    &["GetReadings", "DoCommand", "GetGeometries"],
);

viam_rpc::resource_adapter! {
    /// Client for a single sensor.
    pub struct SensorClient => SERVICE;
}

impl SensorClient {
    pub async fn get_readings(&self, extra: Option<Struct>) -> Result<Readings, ViamError> {
        shared::get_readings(&self.inner, extra).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_support::{extra, mock};
    use serde_json::json;
    use viam_rpc::ClientOptions;

    #[tokio::test]
    async fn readings_keep_nested_values() {
        let mock = mock();
        mock.respond(
            "/viam.component.sensor.v1.SensorService/GetReadings",
            json!({ "readings": { "temp_c": 21.5, "window": { "open": false } } }),
        );
        let sensor = SensorClient::new(mock.clone(), "thermo", ClientOptions::default());

        let readings = sensor
            .get_readings(extra(json!({ "unit": "c" })))
            .await
            .unwrap();
        assert_eq!(readings["temp_c"], json!(21.5));
        assert_eq!(readings["window"], json!({ "open": false }));
        assert_eq!(
            mock.last_request(),
            Some(json!({ "name": "thermo", "extra": { "unit": "c" } }))
        );
    }

    #[tokio::test]
    async fn empty_response_is_empty_readings() {
        let mock = mock();
        let sensor = SensorClient::new(mock.clone(), "thermo", ClientOptions::default());
        assert!(sensor.get_readings(None).await.unwrap().is_empty());
    }
}
