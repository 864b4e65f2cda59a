//! [`MotionClient`] – plans and executes motion for a component.
//!
//! `move_component` blocks until the motion finishes. `move_on_map` and
//! `move_on_globe` return an execution id immediately; progress is then
//! observed with [`MotionClient::list_plan_statuses`] and
//! [`MotionClient::get_plan`] and cancelled with [`MotionClient::stop_plan`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use viam_rpc::ServiceDescriptor;
use viam_types::{
    GeoGeometry, GeoPoint, Geometry, Pose, PoseInFrame, ResourceName, Struct, Transform, ViamError,
    WorldState, wire,
};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.service.motion.v1.MotionService",
    &[
        "Move",
        "MoveOnMap",
        "MoveOnGlobe",
        "GetPose",
        "StopPlan",
        "ListPlanStatuses",
        "GetPlan",
        "DoCommand",
    ],
);

// ─────────────────────────────────────────────────────────────────────────────
// Request-side types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearConstraint {
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_float")]
    pub line_tolerance_mm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_float")]
    pub orientation_tolerance_degs: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationConstraint {
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_float")]
    pub orientation_tolerance_degs: Option<f32>,
}

/// A pair of frames allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedFrameCollisions {
    pub frame1: String,
    pub frame2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollisionSpecification {
    pub allows: Vec<AllowedFrameCollisions>,
}

/// Constraints applied to every step of a `move_component` plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub linear_constraint: Vec<LinearConstraint>,
    pub orientation_constraint: Vec<OrientationConstraint>,
    pub collision_specification: Vec<CollisionSpecification>,
}

/// A camera + vision service pair used to detect obstacles while moving.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleDetector {
    pub vision_service: ResourceName,
    pub camera: ResourceName,
}

/// Tuning for `move_on_map` / `move_on_globe`. Unset fields use the
/// service's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionConfiguration {
    pub obstacle_detectors: Vec<ObstacleDetector>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_double")]
    pub position_polling_frequency_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_double")]
    pub obstacle_polling_frequency_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_double")]
    pub plan_deviation_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_double")]
    pub linear_m_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::opt_double")]
    pub angular_degs_per_sec: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response-side types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PlanState {
    #[default]
    #[serde(rename = "PLAN_STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PLAN_STATE_IN_PROGRESS")]
    InProgress,
    #[serde(rename = "PLAN_STATE_STOPPED")]
    Stopped,
    #[serde(rename = "PLAN_STATE_SUCCEEDED")]
    Succeeded,
    #[serde(rename = "PLAN_STATE_FAILED")]
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanStatus {
    pub state: PlanState,
    pub timestamp: Option<DateTime<Utc>>,
    /// Set when the plan stopped or failed.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanStatusWithId {
    pub plan_id: String,
    pub component_name: ResourceName,
    pub execution_id: String,
    pub status: PlanStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentState {
    pub pose: Pose,
}

/// Poses of every moving component at one step of a plan.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanStep {
    pub step: HashMap<String, ComponentState>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub component_name: ResourceName,
    pub execution_id: String,
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanWithStatus {
    pub plan: Plan,
    pub status: PlanStatus,
    pub status_history: Vec<PlanStatus>,
}

/// The current plan of an execution plus every plan it replaced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanHistory {
    pub current_plan_with_status: PlanWithStatus,
    pub replan_history: Vec<PlanWithStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MoveResponse {
    success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExecutionResponse {
    execution_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetPoseResponse {
    pose: PoseInFrame,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanStatusesResponse {
    plan_statuses_with_ids: Vec<PlanStatusWithId>,
}

viam_rpc::resource_adapter! {
    /// Client for a single motion service.
    pub struct MotionClient => SERVICE;
}

impl MotionClient {
    /// Move `component` so that it ends at `destination`. Returns whether
    /// the motion succeeded.
    pub async fn move_component(
        &self,
        destination: &PoseInFrame,
        component: &ResourceName,
        world_state: Option<&WorldState>,
        constraints: Option<&Constraints>,
        extra: Option<Struct>,
    ) -> Result<bool, ViamError> {
        let mut request = json!({
            "name": self.name(),
            "destination": destination,
            "componentName": component,
            "extra": wire::extra(extra),
        });
        if let Some(world_state) = world_state {
            request["worldState"] = json!(world_state);
        }
        if let Some(constraints) = constraints {
            request["constraints"] = json!(constraints);
        }
        let resp: MoveResponse = self.inner.call("Move", request).await?;
        Ok(resp.success)
    }

    /// Start moving a base to `destination` on the SLAM map. Returns the
    /// execution id.
    pub async fn move_on_map(
        &self,
        destination: Pose,
        component: &ResourceName,
        slam_service: &ResourceName,
        configuration: Option<&MotionConfiguration>,
        obstacles: &[Geometry],
        extra: Option<Struct>,
    ) -> Result<String, ViamError> {
        let mut request = json!({
            "name": self.name(),
            "destination": destination,
            "componentName": component,
            "slamServiceName": slam_service,
            "obstacles": obstacles,
            "extra": wire::extra(extra),
        });
        if let Some(configuration) = configuration {
            request["motionConfiguration"] = json!(configuration);
        }
        let resp: ExecutionResponse = self.inner.call("MoveOnMap", request).await?;
        Ok(resp.execution_id)
    }

    /// Start moving a base to a GPS `destination`. `heading` is the final
    /// compass heading in degrees, if it matters. Returns the execution id.
    #[allow(clippy::too_many_arguments)]
    pub async fn move_on_globe(
        &self,
        destination: GeoPoint,
        component: &ResourceName,
        movement_sensor: &ResourceName,
        heading: Option<f64>,
        obstacles: &[GeoGeometry],
        configuration: Option<&MotionConfiguration>,
        extra: Option<Struct>,
    ) -> Result<String, ViamError> {
        let mut request = json!({
            "name": self.name(),
            "destination": destination,
            "componentName": component,
            "movementSensorName": movement_sensor,
            "obstacles": obstacles,
            "extra": wire::extra(extra),
        });
        if let Some(heading) = heading {
            request["heading"] = json!(heading);
        }
        if let Some(configuration) = configuration {
            request["motionConfiguration"] = json!(configuration);
        }
        let resp: ExecutionResponse = self.inner.call("MoveOnGlobe", request).await?;
        Ok(resp.execution_id)
    }

    /// Pose of `component` expressed in `destination_frame`.
    pub async fn get_pose(
        &self,
        component: &ResourceName,
        destination_frame: &str,
        supplemental_transforms: &[Transform],
        extra: Option<Struct>,
    ) -> Result<PoseInFrame, ViamError> {
        let request = json!({
            "name": self.name(),
            "componentName": component,
            "destinationFrame": destination_frame,
            "supplementalTransforms": supplemental_transforms,
            "extra": wire::extra(extra),
        });
        let resp: GetPoseResponse = self.inner.call("GetPose", request).await?;
        Ok(resp.pose)
    }

    /// Stop the executing plan of `component`.
    pub async fn stop_plan(&self, component: &ResourceName, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "componentName": component,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("StopPlan", request).await
    }

    pub async fn list_plan_statuses(
        &self,
        only_active_plans: bool,
        extra: Option<Struct>,
    ) -> Result<Vec<PlanStatusWithId>, ViamError> {
        let request = json!({
            "name": self.name(),
            "onlyActivePlans": only_active_plans,
            "extra": wire::extra(extra),
        });
        let resp: PlanStatusesResponse = self.inner.call("ListPlanStatuses", request).await?;
        Ok(resp.plan_statuses_with_ids)
    }

    /// Plan history of `component`. Without `execution_id` the most recent
    /// execution is reported.
    pub async fn get_plan(
        &self,
        component: &ResourceName,
        last_plan_only: bool,
        execution_id: Option<&str>,
        extra: Option<Struct>,
    ) -> Result<PlanHistory, ViamError> {
        let mut request = json!({
            "name": self.name(),
            "componentName": component,
            "lastPlanOnly": last_plan_only,
            "extra": wire::extra(extra),
        });
        if let Some(execution_id) = execution_id {
            request["executionId"] = json!(execution_id);
        }
        self.inner.call("GetPlan", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock;
    use viam_rpc::ClientOptions;

    const ROUTE: &str = "/viam.service.motion.v1.MotionService";

    fn make_client() -> (std::sync::Arc<viam_rpc::MockChannel>, MotionClient) {
        let mock = mock();
        let motion = MotionClient::new(mock.clone(), "builtin", ClientOptions::default());
        (mock, motion)
    }

    #[tokio::test]
    async fn move_component_omits_unset_optionals() {
        let (mock, motion) = make_client();
        mock.respond(&format!("{ROUTE}/Move"), json!({ "success": true }));
        let arm = ResourceName::component("arm", "arm-1");
        let destination = PoseInFrame::new("world", Pose { x: 100.0, o_z: 1.0, ..Pose::default() });

        assert!(motion.move_component(&destination, &arm, None, None, None).await.unwrap());

        let request = mock.last_request().unwrap();
        assert_eq!(request["componentName"]["subtype"], json!("arm"));
        assert_eq!(request["componentName"]["type"], json!("component"));
        assert_eq!(request["destination"]["referenceFrame"], json!("world"));
        assert!(request.get("worldState").is_none());
        assert!(request.get("constraints").is_none());
    }

    #[tokio::test]
    async fn move_component_sends_constraints() {
        let (mock, motion) = make_client();
        let constraints = Constraints {
            linear_constraint: vec![LinearConstraint {
                line_tolerance_mm: Some(5.0),
                orientation_tolerance_degs: None,
            }],
            ..Constraints::default()
        };

        motion
            .move_component(
                &PoseInFrame::default(),
                &ResourceName::component("arm", "a"),
                Some(&WorldState::default()),
                Some(&constraints),
                None,
            )
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(
            request["constraints"]["linearConstraint"],
            json!([{ "lineToleranceMm": 5.0 }])
        );
        assert_eq!(request["worldState"], json!({ "obstacles": [], "transforms": [] }));
    }

    #[tokio::test]
    async fn move_on_globe_returns_execution_id() {
        let (mock, motion) = make_client();
        mock.respond(&format!("{ROUTE}/MoveOnGlobe"), json!({ "executionId": "exec-42" }));

        let id = motion
            .move_on_globe(
                GeoPoint::new(40.0, -73.0),
                &ResourceName::component("base", "rover"),
                &ResourceName::component("movement_sensor", "gps"),
                Some(90.0),
                &[],
                Some(&MotionConfiguration {
                    plan_deviation_m: Some(2.5),
                    ..MotionConfiguration::default()
                }),
                None,
            )
            .await
            .unwrap();

        assert_eq!(id, "exec-42");
        let request = mock.last_request().unwrap();
        assert_eq!(request["heading"], json!(90.0));
        assert_eq!(request["motionConfiguration"]["planDeviationM"], json!(2.5));
        assert_eq!(request["movementSensorName"]["name"], json!("gps"));
    }

    #[tokio::test]
    async fn move_on_map_sends_slam_service() {
        let (mock, motion) = make_client();
        mock.respond(&format!("{ROUTE}/MoveOnMap"), json!({ "executionId": "exec-1" }));

        let id = motion
            .move_on_map(
                Pose::default(),
                &ResourceName::component("base", "rover"),
                &ResourceName::service("slam", "map"),
                None,
                &[],
                None,
            )
            .await
            .unwrap();
        assert_eq!(id, "exec-1");
        assert_eq!(mock.last_request().unwrap()["slamServiceName"]["type"], json!("service"));
    }

    #[tokio::test]
    async fn plan_statuses_decode_state_and_reason() {
        let (mock, motion) = make_client();
        mock.respond(
            &format!("{ROUTE}/ListPlanStatuses"),
            json!({ "planStatusesWithIds": [{
                "planId": "p1",
                "executionId": "e1",
                "componentName": { "namespace": "rdk", "type": "component", "subtype": "base", "name": "rover" },
                "status": { "state": "PLAN_STATE_FAILED", "reason": "obstacle", "timestamp": "2024-03-01T10:00:00Z" }
            }]}),
        );

        let statuses = motion.list_plan_statuses(true, None).await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status.state, PlanState::Failed);
        assert_eq!(statuses[0].status.reason.as_deref(), Some("obstacle"));
        assert_eq!(statuses[0].component_name.name, "rover");
        assert_eq!(mock.last_request().unwrap()["onlyActivePlans"], json!(true));
    }

    #[tokio::test]
    async fn get_plan_passes_execution_id_only_when_given() {
        let (mock, motion) = make_client();
        let base = ResourceName::component("base", "rover");

        motion.get_plan(&base, false, None, None).await.unwrap();
        assert!(mock.last_request().unwrap().get("executionId").is_none());

        mock.respond(
            &format!("{ROUTE}/GetPlan"),
            json!({
                "currentPlanWithStatus": {
                    "plan": { "id": "p2", "steps": [{ "step": { "rover": { "pose": { "x": 1.0 } } } }] },
                    "status": { "state": "PLAN_STATE_IN_PROGRESS" }
                },
                "replanHistory": [{ "plan": { "id": "p1" } }]
            }),
        );
        let history = motion.get_plan(&base, false, Some("e1"), None).await.unwrap();
        assert_eq!(mock.last_request().unwrap()["executionId"], json!("e1"));
        assert_eq!(history.current_plan_with_status.plan.id, "p2");
        assert_eq!(history.current_plan_with_status.plan.steps[0].step["rover"].pose.x, 1.0);
        assert_eq!(history.replan_history[0].plan.id, "p1");
    }

    #[tokio::test]
    async fn get_pose_and_stop_plan() {
        let (mock, motion) = make_client();
        mock.respond(
            &format!("{ROUTE}/GetPose"),
            json!({ "pose": { "referenceFrame": "world", "pose": { "z": 300.0 } } }),
        );
        let gripper = ResourceName::component("gripper", "claw");

        let pose = motion.get_pose(&gripper, "world", &[], None).await.unwrap();
        assert_eq!(pose.pose.map(|p| p.z), Some(300.0));

        motion.stop_plan(&gripper, None).await.unwrap();
        assert_eq!(mock.calls()[1].path, format!("{ROUTE}/StopPlan"));
    }
}
