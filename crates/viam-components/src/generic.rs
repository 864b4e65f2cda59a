//! [`GenericComponentClient`] – a component with no typed API beyond
//! `do_command`.

use viam_rpc::ServiceDescriptor;
use viam_types::{Geometry, Struct, ViamError};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.generic.v1.GenericService",
    &["DoCommand", "GetGeometries"],
);

viam_rpc::resource_adapter! {
    pub struct GenericComponentClient => SERVICE;
}

impl GenericComponentClient {
    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_support::{extra, mock};
    use serde_json::json;
    use viam_rpc::ClientOptions;

    #[tokio::test]
    async fn do_command_wraps_and_unwraps() {
        let mock = mock();
        mock.respond(
            "/viam.component.generic.v1.GenericService/DoCommand",
            json!({ "result": { "status": "ok" } }),
        );
        let widget = GenericComponentClient::new(mock.clone(), "widget", ClientOptions::default());

        let command = extra(json!({ "foo": 1 })).unwrap();
        let result = widget.do_command(command).await.unwrap();

        assert_eq!(result.get("status"), Some(&json!("ok")));
        assert_eq!(
            mock.last_request(),
            Some(json!({ "name": "widget", "command": { "foo": 1 } }))
        );
    }

    #[tokio::test]
    async fn do_command_without_result_is_empty() {
        let mock = mock();
        let widget = GenericComponentClient::new(mock.clone(), "widget", ClientOptions::default());
        assert!(widget.do_command(Struct::new()).await.unwrap().is_empty());
    }
}
