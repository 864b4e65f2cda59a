//! [`AppClient`] – organisations, locations, machines and machine parts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use viam_rpc::{CancelToken, Channel, ClientOptions, ResourceClient, ServiceDescriptor, for_each_item};
use viam_types::{Struct, ViamError};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.app.v1.AppService",
    &[
        "GetUserIDByEmail",
        "ListOrganizations",
        "GetOrganization",
        "ListLocations",
        "GetLocation",
        "ListRobots",
        "GetRobot",
        "NewRobot",
        "DeleteRobot",
        "GetRobotParts",
        "GetRobotPart",
        "UpdateRobotPart",
        "MarkPartForRestart",
        "GetRobotPartLogs",
        "TailRobotPartLogs",
        "GetRobotPartHistory",
    ],
);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_on: Option<DateTime<Utc>>,
    pub public_namespace: String,
    pub default_region: String,
    pub cid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationOrganization {
    pub organization_id: String,
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub parent_location_id: String,
    pub organizations: Vec<LocationOrganization>,
    pub created_on: Option<DateTime<Utc>>,
    pub robot_count: i32,
}

/// A machine: a named group of parts in one location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Robot {
    pub id: String,
    pub name: String,
    pub location: String,
    pub last_access: Option<DateTime<Utc>>,
    pub created_on: Option<DateTime<Utc>>,
}

/// One process of a machine, running its own server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RobotPart {
    pub id: String,
    pub name: String,
    pub dns_name: String,
    pub secret: String,
    pub robot: String,
    pub location_id: String,
    pub robot_config: Option<Struct>,
    pub last_access: Option<DateTime<Utc>>,
    pub user_supplied_info: Option<Struct>,
    pub main_part: bool,
    pub fqdn: String,
    pub local_fqdn: String,
    pub created_on: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RobotPartHistoryEntry {
    pub part: String,
    pub robot: String,
    pub when: Option<DateTime<Utc>>,
    pub old: Option<RobotPart>,
}

/// One log line emitted by a machine part.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogEntry {
    pub host: String,
    pub level: String,
    pub time: Option<DateTime<Utc>>,
    pub logger_name: String,
    pub message: String,
    pub caller: Option<Struct>,
    pub stack: String,
    pub fields: Vec<Struct>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UserIdResponse {
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganizationsResponse {
    organizations: Vec<Organization>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganizationResponse {
    organization: Organization,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationsResponse {
    locations: Vec<Location>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationResponse {
    location: Location,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RobotsResponse {
    robots: Vec<Robot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RobotResponse {
    robot: Robot,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartsResponse {
    parts: Vec<RobotPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PartResponse {
    part: RobotPart,
    config_json: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LogsResponse {
    logs: Vec<LogEntry>,
    next_page_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryResponse {
    history: Vec<RobotPartHistoryEntry>,
}

/// Client for the fleet-management service of the cloud app.
#[derive(Debug, Clone)]
pub struct AppClient {
    inner: ResourceClient,
}

impl AppClient {
    pub fn new(channel: Arc<dyn Channel>, options: ClientOptions) -> Self {
        Self {
            inner: ResourceClient::new(channel, &SERVICE, "", options),
        }
    }

    pub async fn get_user_id_by_email(&self, email: &str) -> Result<String, ViamError> {
        let resp: UserIdResponse = self
            .inner
            .call("GetUserIDByEmail", json!({ "email": email }))
            .await?;
        Ok(resp.user_id)
    }

    /// Organisations the caller belongs to.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, ViamError> {
        let resp: OrganizationsResponse = self.inner.call("ListOrganizations", json!({})).await?;
        Ok(resp.organizations)
    }

    pub async fn get_organization(&self, org_id: &str) -> Result<Organization, ViamError> {
        let resp: OrganizationResponse = self
            .inner
            .call("GetOrganization", json!({ "organizationId": org_id }))
            .await?;
        Ok(resp.organization)
    }

    pub async fn list_locations(&self, org_id: &str) -> Result<Vec<Location>, ViamError> {
        let resp: LocationsResponse = self
            .inner
            .call("ListLocations", json!({ "organizationId": org_id }))
            .await?;
        Ok(resp.locations)
    }

    pub async fn get_location(&self, location_id: &str) -> Result<Location, ViamError> {
        let resp: LocationResponse = self
            .inner
            .call("GetLocation", json!({ "locationId": location_id }))
            .await?;
        Ok(resp.location)
    }

    pub async fn list_robots(&self, location_id: &str) -> Result<Vec<Robot>, ViamError> {
        let resp: RobotsResponse = self
            .inner
            .call("ListRobots", json!({ "locationId": location_id }))
            .await?;
        Ok(resp.robots)
    }

    pub async fn get_robot(&self, robot_id: &str) -> Result<Robot, ViamError> {
        let resp: RobotResponse = self.inner.call("GetRobot", json!({ "id": robot_id })).await?;
        Ok(resp.robot)
    }

    /// Create a machine in `location_id` and return its id.
    pub async fn new_robot(&self, name: &str, location_id: &str) -> Result<String, ViamError> {
        let resp: IdResponse = self
            .inner
            .call("NewRobot", json!({ "name": name, "location": location_id }))
            .await?;
        Ok(resp.id)
    }

    pub async fn delete_robot(&self, robot_id: &str) -> Result<(), ViamError> {
        self.inner.call_empty("DeleteRobot", json!({ "id": robot_id })).await
    }

    pub async fn get_robot_parts(&self, robot_id: &str) -> Result<Vec<RobotPart>, ViamError> {
        let resp: PartsResponse = self
            .inner
            .call("GetRobotParts", json!({ "robotId": robot_id }))
            .await?;
        Ok(resp.parts)
    }

    /// The part and its configuration rendered as a JSON document.
    pub async fn get_robot_part(&self, part_id: &str) -> Result<(RobotPart, String), ViamError> {
        let resp: PartResponse = self.inner.call("GetRobotPart", json!({ "id": part_id })).await?;
        Ok((resp.part, resp.config_json))
    }

    /// Rename the part and replace its configuration.
    pub async fn update_robot_part(
        &self,
        part_id: &str,
        name: &str,
        robot_config: &Struct,
    ) -> Result<RobotPart, ViamError> {
        let request = json!({ "id": part_id, "name": name, "robotConfig": robot_config });
        let resp: PartResponse = self.inner.call("UpdateRobotPart", request).await?;
        Ok(resp.part)
    }

    pub async fn mark_part_for_restart(&self, part_id: &str) -> Result<(), ViamError> {
        self.inner
            .call_empty("MarkPartForRestart", json!({ "partId": part_id }))
            .await
    }

    /// One page of the part's stored logs, newest first, plus the token of
    /// the next page (empty on the last page).
    pub async fn get_robot_part_logs(
        &self,
        part_id: &str,
        filter: Option<&str>,
        page_token: Option<&str>,
        levels: &[&str],
    ) -> Result<(Vec<LogEntry>, String), ViamError> {
        let mut request = json!({ "id": part_id, "levels": levels });
        if let Some(filter) = filter {
            request["filter"] = json!(filter);
        }
        if let Some(token) = page_token {
            request["pageToken"] = json!(token);
        }
        let resp: LogsResponse = self.inner.call("GetRobotPartLogs", request).await?;
        Ok((resp.logs, resp.next_page_token))
    }

    /// Follow the part's live logs, appending every entry of every chunk to
    /// `sink` until the stream ends or `cancel` fires. Returns the number of
    /// entries appended.
    pub async fn tail_robot_part_logs(
        &self,
        part_id: &str,
        errors_only: bool,
        filter: Option<&str>,
        sink: &mut Vec<LogEntry>,
        cancel: Option<CancelToken>,
    ) -> Result<usize, ViamError> {
        self.follow_robot_part_logs(part_id, errors_only, filter, |entry| sink.push(entry), cancel)
            .await
    }

    /// Like [`tail_robot_part_logs`](Self::tail_robot_part_logs), but hands
    /// each entry to `on_entry` as soon as its chunk arrives and keeps
    /// nothing.
    pub async fn follow_robot_part_logs<F>(
        &self,
        part_id: &str,
        errors_only: bool,
        filter: Option<&str>,
        on_entry: F,
        cancel: Option<CancelToken>,
    ) -> Result<usize, ViamError>
    where
        F: FnMut(LogEntry),
    {
        let mut request = json!({ "id": part_id, "errorsOnly": errors_only });
        if let Some(filter) = filter {
            request["filter"] = json!(filter);
        }
        let stream = self.inner.stream("TailRobotPartLogs", request).await?;
        let delivered = for_each_item(stream, project_logs, on_entry, cancel).await?;
        debug!(target: "viam_app", part_id, delivered, "log tail finished");
        Ok(delivered)
    }

    pub async fn get_robot_part_history(
        &self,
        part_id: &str,
    ) -> Result<Vec<RobotPartHistoryEntry>, ViamError> {
        let resp: HistoryResponse = self
            .inner
            .call("GetRobotPartHistory", json!({ "id": part_id }))
            .await?;
        Ok(resp.history)
    }
}

fn project_logs(chunk: Value) -> Result<Vec<LogEntry>, ViamError> {
    let resp: LogsResponse = serde_json::from_value(chunk)?;
    Ok(resp.logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock;
    use viam_rpc::CancelHandle;

    const ROUTE: &str = "/viam.app.v1.AppService";

    fn log(message: &str) -> Value {
        json!({ "host": "pi", "level": "info", "loggerName": "rdk", "message": message,
                "time": "2024-05-01T12:00:00Z" })
    }

    #[tokio::test]
    async fn tail_appends_every_entry_of_every_chunk() {
        let mock = mock();
        mock.stream(
            &format!("{ROUTE}/TailRobotPartLogs"),
            vec![
                Ok(json!({ "logs": [log("a"), log("b")] })),
                Ok(json!({ "logs": [] })),
                Ok(json!({ "logs": [log("c")] })),
            ],
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());
        let mut sink = vec![LogEntry {
            message: "earlier".into(),
            ..Default::default()
        }];

        let appended = app
            .tail_robot_part_logs("part-1", true, None, &mut sink, None)
            .await
            .unwrap();

        assert_eq!(appended, 3);
        let messages: Vec<&str> = sink.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["earlier", "a", "b", "c"]);
        assert!(sink[1].time.is_some());
        assert_eq!(
            mock.last_request(),
            Some(json!({ "id": "part-1", "errorsOnly": true }))
        );
    }

    #[tokio::test]
    async fn tail_cancel_keeps_received_entries() {
        let mock = mock();
        mock.stream_then_hang(
            &format!("{ROUTE}/TailRobotPartLogs"),
            vec![Ok(json!({ "logs": [log("first")] }))],
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());
        let handle = CancelHandle::new();
        let token = handle.token();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            handle.cancel();
        });

        let mut sink = Vec::new();
        let appended = app
            .tail_robot_part_logs("part-1", false, Some("motor"), &mut sink, Some(token))
            .await
            .unwrap();
        canceller.await.unwrap();

        assert_eq!(appended, 1);
        assert_eq!(sink[0].message, "first");
    }

    #[tokio::test]
    async fn tail_stops_on_stream_failure() {
        let mock = mock();
        mock.stream(
            &format!("{ROUTE}/TailRobotPartLogs"),
            vec![
                Ok(json!({ "logs": [log("a")] })),
                Err(ViamError::Transport("reset".into())),
            ],
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());
        let mut sink = Vec::new();

        let err = app
            .tail_robot_part_logs("part-1", false, None, &mut sink, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ViamError::Transport(_)));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn follow_delivers_entries_while_the_stream_is_open() {
        let mock = mock();
        mock.stream_then_hang(
            &format!("{ROUTE}/TailRobotPartLogs"),
            vec![
                Ok(json!({ "logs": [log("a"), log("b")] })),
                Ok(json!({ "logs": [log("c")] })),
            ],
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());
        let handle = CancelHandle::new();
        let mut seen = Vec::new();

        // The stream never ends, so the entries must arrive before cancel.
        let delivered = app
            .follow_robot_part_logs(
                "part-1",
                false,
                None,
                |entry| {
                    seen.push(entry.message);
                    if seen.len() == 3 {
                        handle.cancel();
                    }
                },
                Some(handle.token()),
            )
            .await
            .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn robot_part_returns_config_json() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetRobotPart"),
            json!({
                "part": { "id": "part-1", "name": "main", "mainPart": true, "fqdn": "main.abc.viam.cloud" },
                "configJson": "{\"components\":[]}"
            }),
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());

        let (part, config) = app.get_robot_part("part-1").await.unwrap();
        assert!(part.main_part);
        assert_eq!(part.fqdn, "main.abc.viam.cloud");
        assert_eq!(config, "{\"components\":[]}");
    }

    #[tokio::test]
    async fn part_logs_page() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetRobotPartLogs"),
            json!({ "logs": [log("boot")], "nextPageToken": "p2" }),
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());

        let (logs, next) = app
            .get_robot_part_logs("part-1", None, Some("p1"), &["error", "warn"])
            .await
            .unwrap();

        assert_eq!(logs[0].message, "boot");
        assert_eq!(next, "p2");
        assert_eq!(
            mock.last_request(),
            Some(json!({ "id": "part-1", "levels": ["error", "warn"], "pageToken": "p1" }))
        );
    }

    #[tokio::test]
    async fn new_robot_returns_id() {
        let mock = mock();
        mock.respond(&format!("{ROUTE}/NewRobot"), json!({ "id": "robot-9" }));
        let app = AppClient::new(mock.clone(), ClientOptions::default());

        let id = app.new_robot("rover", "loc-1").await.unwrap();
        assert_eq!(id, "robot-9");
        assert_eq!(
            mock.last_request(),
            Some(json!({ "name": "rover", "location": "loc-1" }))
        );
    }

    #[tokio::test]
    async fn organizations_and_locations() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/ListOrganizations"),
            json!({ "organizations": [{ "id": "org-1", "name": "Acme" }] }),
        );
        mock.respond(
            &format!("{ROUTE}/ListLocations"),
            json!({ "locations": [{ "id": "loc-1", "name": "Lab", "robotCount": 3,
                                   "organizations": [{ "organizationId": "org-1", "primary": true }] }] }),
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());

        let orgs = app.list_organizations().await.unwrap();
        let locations = app.list_locations(&orgs[0].id).await.unwrap();

        assert_eq!(locations[0].robot_count, 3);
        assert!(locations[0].organizations[0].primary);
        assert_eq!(mock.last_request(), Some(json!({ "organizationId": "org-1" })));
    }

    #[tokio::test]
    async fn history_and_restart() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetRobotPartHistory"),
            json!({ "history": [{ "part": "part-1", "robot": "robot-1",
                                  "when": "2024-04-01T08:00:00Z", "old": { "name": "main" } }] }),
        );
        let app = AppClient::new(mock.clone(), ClientOptions::default());

        let history = app.get_robot_part_history("part-1").await.unwrap();
        assert_eq!(history[0].old.as_ref().map(|p| p.name.as_str()), Some("main"));

        app.mark_part_for_restart("part-1").await.unwrap();
        assert_eq!(mock.last_request(), Some(json!({ "partId": "part-1" })));
    }

    #[test]
    fn app_service_has_no_do_command() {
        assert!(!SERVICE.supports(viam_rpc::DO_COMMAND));
    }
}
