//! [`InputControllerClient`] – gamepads, joysticks and other input
//! devices.
//!
//! Requests address the device through a `controller` field instead of
//! `name`. Events carry a control name (`"ButtonSouth"`, `"AbsoluteX"`, ...),
//! an event type (`"ButtonPress"`, `"PositionChangeAbs"`, ...), a value and a
//! timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use viam_rpc::{CancelToken, ServiceDescriptor, collect_into};
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.inputcontroller.v1.InputControllerService",
    &[
        "GetControls",
        "GetEvents",
        "StreamEvents",
        "TriggerEvent",
        "DoCommand",
        "GetGeometries",
    ],
);

/// One input event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    pub event: String,
    pub control: String,
    #[serde(with = "wire::double")]
    pub value: f64,
}

/// Which events to stream for one control. `cancelled_events` unregisters
/// events previously requested for that control.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    pub control: String,
    pub events: Vec<String>,
    pub cancelled_events: Vec<String>,
}

impl EventSubscription {
    pub fn new(control: impl Into<String>, events: &[&str]) -> Self {
        Self {
            control: control.into(),
            events: events.iter().map(|e| (*e).to_string()).collect(),
            cancelled_events: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControlsResponse {
    controls: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventsResponse {
    events: Vec<InputEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StreamEventsChunk {
    event: Option<InputEvent>,
}

viam_rpc::resource_adapter! {
    /// Client for a single input controller.
    pub struct InputControllerClient => SERVICE;
}

impl InputControllerClient {
    /// Names of every control the device exposes.
    pub async fn get_controls(&self, extra: Option<Struct>) -> Result<Vec<String>, ViamError> {
        let request = json!({ "controller": self.name(), "extra": wire::extra(extra) });
        let resp: ControlsResponse = self.inner.call("GetControls", request).await?;
        Ok(resp.controls)
    }

    /// The most recent event of each control.
    pub async fn get_events(&self, extra: Option<Struct>) -> Result<Vec<InputEvent>, ViamError> {
        let request = json!({ "controller": self.name(), "extra": wire::extra(extra) });
        let resp: EventsResponse = self.inner.call("GetEvents", request).await?;
        Ok(resp.events)
    }

    /// Inject an event, for controllers that support it.
    pub async fn trigger_event(&self, event: &InputEvent, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({
            "controller": self.name(),
            "event": event,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("TriggerEvent", request).await
    }

    /// Append every event matching `subscriptions` to `sink` as it arrives.
    /// Returns the number appended once the stream ends or `cancel` fires.
    pub async fn stream_events(
        &self,
        subscriptions: &[EventSubscription],
        sink: &mut Vec<InputEvent>,
        cancel: Option<CancelToken>,
        extra: Option<Struct>,
    ) -> Result<usize, ViamError> {
        let request = json!({
            "controller": self.name(),
            "events": subscriptions,
            "extra": wire::extra(extra),
        });
        let stream = self.inner.stream("StreamEvents", request).await?;
        collect_into(
            stream,
            sink,
            |chunk: Value| Ok(serde_json::from_value::<StreamEventsChunk>(chunk)?.event),
            cancel,
        )
        .await
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

    const ROUTE: &str = "/viam.component.inputcontroller.v1.InputControllerService";

    #[tokio::test]
    async fn requests_use_controller_field() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetControls"),
            json!({ "controls": ["AbsoluteX", "ButtonSouth"] }),
        );
        let pad = InputControllerClient::new(mock.clone(), "pad", ClientOptions::default());

        assert_eq!(
            pad.get_controls(None).await.unwrap(),
            vec!["AbsoluteX", "ButtonSouth"]
        );
        assert_eq!(
            mock.last_request(),
            Some(json!({ "controller": "pad", "extra": {} }))
        );
    }

    #[tokio::test]
    async fn trigger_event_serializes_event() {
        let mock = mock();
        let pad = InputControllerClient::new(mock.clone(), "pad", ClientOptions::default());
        let event = InputEvent {
            time: None,
            event: "ButtonPress".into(),
            control: "ButtonSouth".into(),
            value: 1.0,
        };

        pad.trigger_event(&event, None).await.unwrap();
        assert_eq!(
            mock.last_request().unwrap()["event"],
            json!({ "event": "ButtonPress", "control": "ButtonSouth", "value": 1.0 })
        );
    }

    #[tokio::test]
    async fn stream_events_appends_each_event() {
        let mock = mock();
        mock.stream(
            &format!("{ROUTE}/StreamEvents"),
            vec![
                Ok(json!({ "event": { "event": "ButtonPress", "control": "ButtonSouth", "value": 1.0,
                                      "time": "2024-01-01T00:00:00Z" } })),
                Ok(json!({})),
                Ok(json!({ "event": { "event": "ButtonRelease", "control": "ButtonSouth" } })),
            ],
        );
        let pad = InputControllerClient::new(mock.clone(), "pad", ClientOptions::default());
        let subs = [EventSubscription::new("ButtonSouth", &["ButtonPress", "ButtonRelease"])];

        let mut events = Vec::new();
        let appended = pad.stream_events(&subs, &mut events, None, None).await.unwrap();

        assert_eq!(appended, 2);
        assert_eq!(events[0].event, "ButtonPress");
        assert!(events[0].time.is_some());
        assert_eq!(events[1].event, "ButtonRelease");
        assert_eq!(
            mock.calls()[0].request["events"],
            json!([{ "control": "ButtonSouth", "events": ["ButtonPress", "ButtonRelease"], "cancelledEvents": [] }])
        );
    }
}
