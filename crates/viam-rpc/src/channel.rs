//! The transport seam.
//!
//! Adapters never talk to HTTP, gRPC or sockets directly. They hand a JSON
//! request and a [`MethodPath`] to a [`Channel`] and await the answer.
//! Connection management, authentication and timeouts all live behind this
//! trait.

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;
use viam_types::ViamError;

/// Server-streamed responses, one decoded message per item.
pub type ResponseStream = BoxStream<'static, Result<Value, ViamError>>;

/// Fully-qualified remote method, e.g.
/// `viam.component.motor.v1.MotorService` / `SetPower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodPath {
    pub service: &'static str,
    pub method: &'static str,
}

impl MethodPath {
    pub const fn new(service: &'static str, method: &'static str) -> Self {
        Self { service, method }
    }

    /// The route used on the wire: `/<service>/<method>`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.method)
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.service, self.method)
    }
}

/// Every transport the adapters can run over must implement this trait.
///
/// # Contract
///
/// * `unary` – send one request, resolve with one response or the failure
///   reported by the transport or the remote side.
/// * `server_stream` – send one request, resolve with a stream that yields
///   each response message in delivery order and then ends. A failure after
///   the stream opened is yielded as the final item.
///
/// Implementations must not retry; failures surface unchanged.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn unary(&self, method: &MethodPath, request: Value) -> Result<Value, ViamError>;

    async fn server_stream(
        &self,
        method: &MethodPath,
        request: Value,
    ) -> Result<ResponseStream, ViamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_path_renders_route() {
        let path = MethodPath::new("viam.component.motor.v1.MotorService", "SetPower");
        assert_eq!(path.path(), "/viam.component.motor.v1.MotorService/SetPower");
        assert_eq!(path.to_string(), path.path());
    }
}
