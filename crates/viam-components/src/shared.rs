//! Calls that many component services define identically.

use serde::Deserialize;
use serde_json::json;
use viam_rpc::ResourceClient;
use viam_types::{Geometry, Readings, Struct, ViamError, wire};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeometriesResponse {
    geometries: Vec<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReadingsResponse {
    readings: Readings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IsMovingResponse {
    is_moving: bool,
}

/// `GetGeometries`: the shapes the resource occupies, in its own frame.
pub(crate) async fn get_geometries(
    client: &ResourceClient,
    extra: Option<Struct>,
) -> Result<Vec<Geometry>, ViamError> {
    let request = json!({ "name": client.name(), "extra": wire::extra(extra) });
    let resp: GeometriesResponse = client.call("GetGeometries", request).await?;
    Ok(resp.geometries)
}

/// `GetReadings`: the resource's current readings keyed by name.
pub(crate) async fn get_readings(
    client: &ResourceClient,
    extra: Option<Struct>,
) -> Result<Readings, ViamError> {
    let request = json!({ "name": client.name(), "extra": wire::extra(extra) });
    let resp: ReadingsResponse = client.call("GetReadings", request).await?;
    Ok(resp.readings)
}

pub(crate) async fn stop(client: &ResourceClient, extra: Option<Struct>) -> Result<(), ViamError> {
    let request = json!({ "name": client.name(), "extra": wire::extra(extra) });
    client.call_empty("Stop", request).await
}

/// `IsMoving` carries no `extra` field.
pub(crate) async fn is_moving(client: &ResourceClient) -> Result<bool, ViamError> {
    let resp: IsMovingResponse = client.call("IsMoving", json!({ "name": client.name() })).await?;
    Ok(resp.is_moving)
}
