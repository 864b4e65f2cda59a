//! [`GantryClient`] – multi-axis linear positioner.
//!
//! Positions, lengths and speeds are per-axis arrays in millimetres (and
//! mm/s), ordered the same way the gantry reports its axes.

use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Kinematics, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.gantry.v1.GantryService",
    &[
        "GetPosition",
        "MoveToPosition",
        "Home",
        "GetLengths",
        "Stop",
        "IsMoving",
        "DoCommand",
        "GetKinematics",
        "GetGeometries",
    ],
);

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PositionResponse {
    #[serde(with = "wire::double_vec")]
    positions_mm: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LengthsResponse {
    #[serde(with = "wire::double_vec")]
    lengths_mm: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HomeResponse {
    homed: bool,
}

viam_rpc::resource_adapter! {
    /// Client for a single gantry.
    pub struct GantryClient => SERVICE;
}

impl GantryClient {
    pub async fn get_position(&self, extra: Option<Struct>) -> Result<Vec<f64>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: PositionResponse = self.inner.call("GetPosition", request).await?;
        Ok(resp.positions_mm)
    }

    /// Move every axis to its target position at its own speed.
    ///
    /// # Errors
    ///
    /// [`ViamError::InvalidArgument`] when `positions_mm` and
    /// `speeds_mm_per_sec` differ in length; nothing is sent in that case.
    pub async fn move_to_position(
        &self,
        positions_mm: &[f64],
        speeds_mm_per_sec: &[f64],
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        if positions_mm.len() != speeds_mm_per_sec.len() {
            warn!(
                gantry = %self.name(),
                positions = positions_mm.len(),
                speeds = speeds_mm_per_sec.len(),
                "rejecting move with mismatched axis arrays"
            );
            return Err(ViamError::InvalidArgument(format!(
                "{} positions but {} speeds",
                positions_mm.len(),
                speeds_mm_per_sec.len()
            )));
        }
        let request = json!({
            "name": self.name(),
            "positionsMm": positions_mm,
            "speedsMmPerSec": speeds_mm_per_sec,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("MoveToPosition", request).await
    }

    /// Run the homing sequence. Returns whether the gantry reports itself
    /// homed.
    pub async fn home(&self, extra: Option<Struct>) -> Result<bool, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: HomeResponse = self.inner.call("Home", request).await?;
        Ok(resp.homed)
    }

    pub async fn get_lengths(&self, extra: Option<Struct>) -> Result<Vec<f64>, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        let resp: LengthsResponse = self.inner.call("GetLengths", request).await?;
        Ok(resp.lengths_mm)
    }

    pub async fn stop(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        shared::stop(&self.inner, extra).await
    }

    pub async fn is_moving(&self) -> Result<bool, ViamError> {
        shared::is_moving(&self.inner).await
    }

    pub async fn get_kinematics(&self, extra: Option<Struct>) -> Result<Kinematics, ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call("GetKinematics", request).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}
