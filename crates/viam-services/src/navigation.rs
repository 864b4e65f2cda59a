//! [`NavigationClient`] – waypoint navigation on a GPS map.
//!
//! `get_location` is the only adapter call that checks the response beyond
//! decoding it: a reply without a location, or with a coordinate that is
//! not a finite number, is reported as an error even though the remote
//! call itself succeeded.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use viam_rpc::ServiceDescriptor;
use viam_types::{GeoGeometry, GeoPoint, Struct, ViamError, wire};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.service.navigation.v1.NavigationService",
    &[
        "GetMode",
        "SetMode",
        "GetLocation",
        "GetWaypoints",
        "AddWaypoint",
        "RemoveWaypoint",
        "GetObstacles",
        "GetPaths",
        "GetProperties",
        "DoCommand",
    ],
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "MODE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "MODE_MANUAL")]
    Manual,
    #[serde(rename = "MODE_WAYPOINT")]
    Waypoint,
    #[serde(rename = "MODE_EXPLORE")]
    Explore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MapType {
    #[default]
    #[serde(rename = "MAP_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "MAP_TYPE_NONE")]
    None,
    #[serde(rename = "MAP_TYPE_GPS")]
    Gps,
}

/// Where the navigated base is and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub location: GeoPoint,
    /// Degrees clockwise from north.
    pub compass_heading: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Waypoint {
    pub id: String,
    pub location: GeoPoint,
}

/// The planned route to one waypoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Path {
    pub destination_waypoint_id: String,
    pub geopoints: Vec<GeoPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModeResponse {
    mode: Mode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaypointsResponse {
    waypoints: Vec<Waypoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObstaclesResponse {
    obstacles: Vec<GeoGeometry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathsResponse {
    paths: Vec<Path>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PropertiesResponse {
    map_type: MapType,
}

viam_rpc::resource_adapter! {
    /// Client for a single navigation service.
    pub struct NavigationClient => SERVICE;
}

impl NavigationClient {
    pub async fn get_mode(&self, extra: Option<Struct>) -> Result<Mode, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: ModeResponse = self.inner.call("GetMode", request).await?;
        Ok(resp.mode)
    }

    pub async fn set_mode(&self, mode: Mode, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "mode": mode, "extra": wire::extra(extra) });
        self.inner.call_empty("SetMode", request).await
    }

    /// Current position and heading.
    ///
    /// # Errors
    ///
    /// * [`ViamError::NoLocation`] – the response has no `location`.
    /// * [`ViamError::InvalidLocation`] – a coordinate is NaN, infinite or
    ///   not a number.
    /// * Channel failures, unchanged.
    pub async fn get_location(&self, extra: Option<Struct>) -> Result<GeoLocation, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp = self.inner.call_value("GetLocation", request).await?;
        parse_location(&resp).inspect_err(|e| {
            warn!(navigation = %self.name(), error = %e, "rejecting location response");
        })
    }

    pub async fn get_waypoints(&self, extra: Option<Struct>) -> Result<Vec<Waypoint>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: WaypointsResponse = self.inner.call("GetWaypoints", request).await?;
        Ok(resp.waypoints)
    }

    pub async fn add_waypoint(&self, point: GeoPoint, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "location": point, "extra": wire::extra(extra) });
        self.inner.call_empty("AddWaypoint", request).await
    }

    pub async fn remove_waypoint(&self, id: &str, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "id": id, "extra": wire::extra(extra) });
        self.inner.call_empty("RemoveWaypoint", request).await
    }

    pub async fn get_obstacles(&self, extra: Option<Struct>) -> Result<Vec<GeoGeometry>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: ObstaclesResponse = self.inner.call("GetObstacles", request).await?;
        Ok(resp.obstacles)
    }

    pub async fn get_paths(&self, extra: Option<Struct>) -> Result<Vec<Path>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: PathsResponse = self.inner.call("GetPaths", request).await?;
        Ok(resp.paths)
    }

    pub async fn get_properties(&self) -> Result<MapType, ViamError> {
        let resp: PropertiesResponse = self
            .inner
            .call("GetProperties", json!({ "name": self.name() }))
            .await?;
        Ok(resp.map_type)
    }
}

fn parse_location(resp: &Value) -> Result<GeoLocation, ViamError> {
    let location = match resp.get("location") {
        None | Some(Value::Null) => return Err(ViamError::NoLocation),
        Some(location) => location,
    };
    let latitude = coordinate(location, "latitude")?;
    let longitude = coordinate(location, "longitude")?;
    let compass_heading = wire::double_value(resp.get("compassHeading").unwrap_or(&Value::Null))?;
    Ok(GeoLocation {
        location: GeoPoint::new(latitude, longitude),
        compass_heading,
    })
}

/// A proto3 `double` that must be finite; absent reads as zero.
fn coordinate(location: &Value, field: &str) -> Result<f64, ViamError> {
    let raw = location.get(field).unwrap_or(&Value::Null);
    match wire::double_value(raw) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ViamError::InvalidLocation(format!("{field} is {raw}"))),
    }
}
