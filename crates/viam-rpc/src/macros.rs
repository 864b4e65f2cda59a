//! Declaration helper for named-resource adapters.

/// Declare a typed adapter bound to one named resource.
///
/// Generates the struct wrapping a [`ResourceClient`][crate::ResourceClient],
/// a no-I/O constructor, `name()` and `do_command()`. The adapter's own
/// operations go in a separate `impl` block.
///
/// ```rust,ignore
/// pub static SERVICE: ServiceDescriptor =
///     ServiceDescriptor::new("viam.component.sensor.v1.SensorService", &["GetReadings", "DoCommand"]);
///
/// viam_rpc::resource_adapter! {
///     /// Reads a sensor.
///     pub struct SensorClient => SERVICE;
/// }
/// ```
#[macro_export]
macro_rules! resource_adapter {
    ($(#[$meta:meta])* $vis:vis struct $adapter:ident => $service:path;) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $adapter {
            inner: $crate::ResourceClient,
        }

        impl $adapter {
            /// Bind the adapter to the resource `name`. Performs no I/O.
            pub fn new(
                channel: ::std::sync::Arc<dyn $crate::Channel>,
                name: impl Into<String>,
                options: $crate::ClientOptions,
            ) -> Self {
                Self {
                    inner: $crate::ResourceClient::new(channel, &$service, name, options),
                }
            }

            /// The bound resource name.
            pub fn name(&self) -> &str {
                self.inner.name()
            }

            /// Send an arbitrary command to the resource and return its
            /// `result` document (`{}` when the resource returns none).
            pub async fn do_command(
                &self,
                command: $crate::Struct,
            ) -> Result<$crate::Struct, $crate::ViamError> {
                self.inner.do_command(command).await
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::{ClientOptions, MockChannel, ServiceDescriptor, Struct};

    static GADGET: ServiceDescriptor =
        ServiceDescriptor::new("viam.component.gadget.v1.GadgetService", &["DoCommand"]);

    crate::resource_adapter! {
        struct GadgetClient => GADGET;
    }

    #[tokio::test]
    async fn generated_adapter_routes_do_command() {
        let mock = Arc::new(MockChannel::new());
        let gadget = GadgetClient::new(mock.clone(), "gadget-7", ClientOptions::default());
        assert_eq!(gadget.name(), "gadget-7");

        gadget.do_command(Struct::new()).await.unwrap();
        assert_eq!(
            mock.last_request(),
            Some(json!({ "name": "gadget-7", "command": {} }))
        );
    }
}
