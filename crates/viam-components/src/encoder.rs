//! [`EncoderClient`] – position feedback in ticks or degrees.

use serde::{Deserialize, Serialize};
use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.encoder.v1.EncoderService",
    &[
        "GetPosition",
        "ResetPosition",
        "GetProperties",
        "DoCommand",
        "GetGeometries",
    ],
);

/// Unit of an encoder position. `Unspecified` asks for the encoder's
/// native unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionType {
    #[default]
    #[serde(rename = "POSITION_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "POSITION_TYPE_TICKS_COUNT")]
    TicksCount,
    #[serde(rename = "POSITION_TYPE_ANGLE_DEGREES")]
    AngleDegrees,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncoderProperties {
    pub ticks_count_supported: bool,
    pub angle_degrees_supported: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PositionResponse {
    #[serde(with = "wire::float")]
    value: f32,
    position_type: PositionType,
}

viam_rpc::resource_adapter! {
    /// Client for a single encoder.
    pub struct EncoderClient => SERVICE;
}

impl EncoderClient {
    /// Current position and the unit it was reported in.
    pub async fn get_position(
        &self,
        position_type: PositionType,
        extra: Option<Struct>,
    ) -> Result<(f64, PositionType), ViamError> {
        let request = json!({
            "name": self.name(),
            "positionType": position_type,
            "extra": wire::extra(extra),
        });
        let resp: PositionResponse = self.inner.call("GetPosition", request).await?;
        Ok((f64::from(resp.value), resp.position_type))
    }

    /// Make the current position read as zero.
    pub async fn reset_position(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call_empty("ResetPosition", request).await
    }

    pub async fn get_properties(&self, extra: Option<Struct>) -> Result<EncoderProperties, ViamError> {
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
    async fn position_type_travels_as_enum_name() {
        let mock = mock();
        mock.respond(
            "/viam.component.encoder.v1.EncoderService/GetPosition",
            json!({ "value": 42.0, "positionType": "POSITION_TYPE_TICKS_COUNT" }),
        );
        let encoder = EncoderClient::new(mock.clone(), "enc", ClientOptions::default());

        let (value, unit) = encoder.get_position(PositionType::Unspecified, None).await.unwrap();
        assert_eq!(value, 42.0);
        assert_eq!(unit, PositionType::TicksCount);
        assert_eq!(
            mock.last_request().unwrap()["positionType"],
            json!("POSITION_TYPE_UNSPECIFIED")
        );
    }

    #[tokio::test]
    async fn properties_default_to_unsupported() {
        let mock = mock();
        let encoder = EncoderClient::new(mock.clone(), "enc", ClientOptions::default());
        assert_eq!(
            encoder.get_properties(None).await.unwrap(),
            EncoderProperties::default()
        );
    }
}
