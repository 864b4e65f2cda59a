//! [`ResourceClient`] – the one generic adapter every typed client wraps.
//!
//! A typed client (motor, camera, navigation, ...) is a method table plus a
//! handful of marshaling functions. The table is a [`ServiceDescriptor`];
//! the dispatch, logging hook, tracing and `DoCommand` plumbing live here
//! once.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use viam_rpc::{ClientOptions, ConnectChannel, ResourceClient, ServiceDescriptor};
//!
//! static MOTOR: ServiceDescriptor = ServiceDescriptor::new(
//!     "viam.component.motor.v1.MotorService",
//!     &["SetPower", "DoCommand"],
//! );
//!
//! # async fn run() -> Result<(), viam_rpc::ViamError> {
//! let channel = Arc::new(ConnectChannel::new("http://localhost:8080"));
//! let client = ResourceClient::new(channel, &MOTOR, "motor-1", ClientOptions::default());
//! client
//!     .call_empty("SetPower", json!({ "name": client.name(), "powerPct": 0.5, "extra": {} }))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use viam_types::{Struct, ViamError};

use crate::channel::{Channel, MethodPath, ResponseStream};
use crate::command;

/// The method table of one remote service.
#[derive(Debug)]
pub struct ServiceDescriptor {
    /// Fully-qualified service name, e.g. `viam.component.arm.v1.ArmService`.
    pub name: &'static str,
    /// Every method the service defines.
    pub methods: &'static [&'static str],
}

impl ServiceDescriptor {
    pub const fn new(name: &'static str, methods: &'static [&'static str]) -> Self {
        Self { name, methods }
    }

    /// Whether `method` is part of this table.
    pub fn supports(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }

    /// Resolve `method` to its [`MethodPath`].
    ///
    /// # Errors
    ///
    /// [`ViamError::UnknownMethod`] when the table does not list `method`.
    pub fn method(&self, method: &str) -> Result<MethodPath, ViamError> {
        self.methods
            .iter()
            .find(|m| **m == method)
            .map(|m| MethodPath::new(self.name, m))
            .ok_or_else(|| ViamError::UnknownMethod {
                service: self.name.to_string(),
                method: method.to_string(),
            })
    }
}

/// Hook invoked with every outgoing request before it is dispatched.
pub type RequestLogger = Arc<dyn Fn(&MethodPath, &Value) + Send + Sync>;

/// Per-client options. The only recognised option is the request logger.
#[derive(Clone, Default)]
pub struct ClientOptions {
    request_logger: Option<RequestLogger>,
}

impl ClientOptions {
    /// Install a hook that observes each request (builder-style).
    pub fn with_request_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&MethodPath, &Value) + Send + Sync + 'static,
    {
        self.request_logger = Some(Arc::new(logger));
        self
    }

    pub fn has_request_logger(&self) -> bool {
        self.request_logger.is_some()
    }

    /// Invoke the hook, if any. Never alters the request.
    pub fn log_request(&self, method: &MethodPath, request: &Value) {
        if let Some(logger) = &self.request_logger {
            logger(method, request);
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field(
                "request_logger",
                if self.request_logger.is_some() { &"<set>" } else { &"<not set>" },
            )
            .finish()
    }
}

/// Immutable `(name, channel, options)` handle bound to one remote resource.
///
/// Construction performs no I/O. Cloning shares the channel.
#[derive(Clone)]
pub struct ResourceClient {
    name: String,
    service: &'static ServiceDescriptor,
    channel: Arc<dyn Channel>,
    options: ClientOptions,
}

impl ResourceClient {
    pub fn new(
        channel: Arc<dyn Channel>,
        service: &'static ServiceDescriptor,
        name: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self {
            name: name.into(),
            service,
            channel,
            options,
        }
    }

    /// The bound resource name. Empty for app-level clients.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &'static ServiceDescriptor {
        self.service
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Dispatch a unary call and decode the response into `R`.
    ///
    /// # Errors
    ///
    /// Whatever the channel reports, unchanged; [`ViamError::Serialization`]
    /// when the response does not fit `R`.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        request: Value,
    ) -> Result<R, ViamError> {
        let path = self.service.method(method)?;
        let response = self.dispatch(&path, request).await?;
        serde_json::from_value(response)
            .map_err(|e| ViamError::Serialization(format!("{path}: {e}")))
    }

    /// Dispatch a unary call and return the raw response document.
    pub async fn call_value(&self, method: &str, request: Value) -> Result<Value, ViamError> {
        let path = self.service.method(method)?;
        self.dispatch(&path, request).await
    }

    /// Dispatch a unary call whose response carries nothing of interest.
    pub async fn call_empty(&self, method: &str, request: Value) -> Result<(), ViamError> {
        self.call_value(method, request).await.map(|_| ())
    }

    /// Open a server stream. Consume it with
    /// [`collect_into`][crate::streaming::collect_into] or
    /// [`concat_bytes`][crate::streaming::concat_bytes].
    pub async fn stream(&self, method: &str, request: Value) -> Result<ResponseStream, ViamError> {
        let path = self.service.method(method)?;
        self.options.log_request(&path, &request);
        debug!(target: "viam_rpc", method = %path, resource = %self.name, "opening server stream");
        self.channel
            .server_stream(&path, request)
            .await
            .inspect_err(|e| warn!(target: "viam_rpc", method = %path, error = %e, "stream failed to open"))
    }

    /// Send an arbitrary command to the bound resource.
    pub async fn do_command(&self, command: Struct) -> Result<Struct, ViamError> {
        command::do_command(
            self.channel.as_ref(),
            &self.options,
            self.service,
            &self.name,
            command,
        )
        .await
    }

    async fn dispatch(&self, path: &MethodPath, request: Value) -> Result<Value, ViamError> {
        self.options.log_request(path, &request);
        debug!(target: "viam_rpc", method = %path, resource = %self.name, "dispatching unary call");
        self.channel
            .unary(path, request)
            .await
            .inspect_err(|e| warn!(target: "viam_rpc", method = %path, error = %e, "call failed"))
    }
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("name", &self.name)
            .field("service", &self.service.name)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChannel;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;

    static TEST_SERVICE: ServiceDescriptor = ServiceDescriptor::new(
        "viam.component.test.v1.TestService",
        &["Ping", "WatchPings", "DoCommand"],
    );

    #[derive(Debug, Deserialize, Default)]
    #[serde(default, rename_all = "camelCase")]
    struct PingResponse {
        round_trips: u32,
    }

    fn make_client(options: ClientOptions) -> (Arc<MockChannel>, ResourceClient) {
        let mock = Arc::new(MockChannel::new());
        let client = ResourceClient::new(mock.clone(), &TEST_SERVICE, "sensor-1", options);
        (mock, client)
    }

    #[test]
    fn construction_performs_no_io() {
        let (mock, client) = make_client(ClientOptions::default());
        assert_eq!(client.name(), "sensor-1");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn descriptor_rejects_unknown_method() {
        let err = TEST_SERVICE.method("Pong").unwrap_err();
        assert!(matches!(err, ViamError::UnknownMethod { .. }));
        assert!(TEST_SERVICE.supports("Ping"));
    }

    #[tokio::test]
    async fn call_decodes_response() {
        let (mock, client) = make_client(ClientOptions::default());
        mock.respond(
            "/viam.component.test.v1.TestService/Ping",
            json!({ "roundTrips": 3 }),
        );

        let resp: PingResponse = client.call("Ping", json!({ "name": "sensor-1" })).await.unwrap();
        assert_eq!(resp.round_trips, 3);
        assert_eq!(mock.last_request(), Some(json!({ "name": "sensor-1" })));
    }

    #[tokio::test]
    async fn unknown_method_sends_nothing() {
        let (mock, client) = make_client(ClientOptions::default());
        let result = client.call_empty("Pong", json!({})).await;
        assert!(matches!(result, Err(ViamError::UnknownMethod { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn channel_failure_propagates_unchanged() {
        let (mock, client) = make_client(ClientOptions::default());
        let failure = ViamError::Remote {
            code: "unavailable".into(),
            message: "machine offline".into(),
        };
        mock.fail("/viam.component.test.v1.TestService/Ping", failure.clone());

        let err = client.call_empty("Ping", json!({})).await.unwrap_err();
        assert_eq!(err, failure);
    }

    #[tokio::test]
    async fn mismatched_response_is_serialization_error() {
        let (mock, client) = make_client(ClientOptions::default());
        mock.respond(
            "/viam.component.test.v1.TestService/Ping",
            json!({ "roundTrips": "many" }),
        );
        let result: Result<PingResponse, _> = client.call("Ping", json!({})).await;
        assert!(matches!(result, Err(ViamError::Serialization(_))));
    }

    #[tokio::test]
    async fn logger_runs_once_before_dispatch_with_exact_request() {
        let mock = Arc::new(MockChannel::new());
        let seen: Arc<Mutex<Vec<(String, Value, usize)>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_by_hook = seen.clone();
        let mock_for_hook = mock.clone();
        let options = ClientOptions::default().with_request_logger(move |path, request| {
            // Record how many calls the channel had seen when the hook ran.
            seen_by_hook
                .lock()
                .push((path.to_string(), request.clone(), mock_for_hook.call_count()));
        });
        let client = ResourceClient::new(mock.clone(), &TEST_SERVICE, "sensor-1", options);

        let request = json!({ "name": "sensor-1", "extra": {} });
        client.call_empty("Ping", request.clone()).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1, "hook must run exactly once");
        assert_eq!(seen[0].0, "/viam.component.test.v1.TestService/Ping");
        assert_eq!(seen[0].1, request);
        assert_eq!(seen[0].2, 0, "hook must run before the channel is called");
        assert_eq!(mock.last_request(), Some(request));
    }

    #[tokio::test]
    async fn logger_runs_once_before_stream_opens() {
        let mock = Arc::new(MockChannel::new());
        let seen: Arc<Mutex<Vec<(String, Value, usize)>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_by_hook = seen.clone();
        let mock_for_hook = mock.clone();
        let options = ClientOptions::default().with_request_logger(move |path, request| {
            seen_by_hook
                .lock()
                .push((path.to_string(), request.clone(), mock_for_hook.call_count()));
        });
        let client = ResourceClient::new(mock.clone(), &TEST_SERVICE, "sensor-1", options);

        let request = json!({ "name": "sensor-1", "intervalMs": "250" });
        client.stream("WatchPings", request.clone()).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/viam.component.test.v1.TestService/WatchPings");
        assert_eq!(seen[0].1, request);
        assert_eq!(seen[0].2, 0);
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].streaming);
        assert_eq!(calls[0].request, request);
    }

    #[test]
    fn options_debug_hides_closure() {
        let opts = ClientOptions::default().with_request_logger(|_, _| {});
        assert!(format!("{opts:?}").contains("<set>"));
        assert!(format!("{:?}", ClientOptions::default()).contains("<not set>"));
    }
}
