//! The `DoCommand` escape hatch shared by every resource service.
//!
//! Wraps an arbitrary command in a `{name, command}` envelope and unwraps
//! the `result` document of the response. A missing `result` is an empty
//! document, not an error.

use serde_json::{Value, json};
use tracing::debug;
use viam_types::{Struct, ViamError};

use crate::channel::Channel;
use crate::client::{ClientOptions, ServiceDescriptor};

/// Method name every resource service registers for the escape hatch.
pub const DO_COMMAND: &str = "DoCommand";

/// Send `command` to the resource `name` served by `service`.
///
/// # Errors
///
/// [`ViamError::UnknownMethod`] if `service` has no `DoCommand` entry,
/// channel failures unchanged, or [`ViamError::Serialization`] when the
/// `result` field is not an object.
pub async fn do_command(
    channel: &dyn Channel,
    options: &ClientOptions,
    service: &ServiceDescriptor,
    name: &str,
    command: Struct,
) -> Result<Struct, ViamError> {
    let path = service.method(DO_COMMAND)?;
    let request = json!({ "name": name, "command": command });
    options.log_request(&path, &request);
    debug!(target: "viam_rpc", method = %path, resource = %name, "dispatching command");

    let response = channel.unary(&path, request).await?;
    let result = match response {
        Value::Object(mut fields) => fields.remove("result"),
        _ => None,
    };
    match result {
        None | Some(Value::Null) => Ok(Struct::new()),
        Some(Value::Object(result)) => Ok(result),
        Some(other) => Err(ViamError::Serialization(format!(
            "{path}: `result` should be an object, got {other}"
        ))),
    }
}
