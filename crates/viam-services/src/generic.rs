//! [`GenericServiceClient`] – a service reachable only through
//! `do_command`.

use viam_rpc::ServiceDescriptor;

pub static SERVICE: ServiceDescriptor =
    ServiceDescriptor::new("viam.service.generic.v1.GenericService", &["DoCommand"]);

viam_rpc::resource_adapter! {
    pub struct GenericServiceClient => SERVICE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock;
    use serde_json::json;
    use viam_rpc::ClientOptions;
    use viam_types::Struct;

    #[tokio::test]
    async fn do_command_routes_to_generic_service() {
        let mock = mock();
        let svc = GenericServiceClient::new(mock.clone(), "planner", ClientOptions::default());

        let mut command = Struct::new();
        command.insert("reset".into(), json!(true));
        svc.do_command(command).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].path, "/viam.service.generic.v1.GenericService/DoCommand");
        assert_eq!(calls[0].request, json!({ "name": "planner", "command": { "reset": true } }));
    }
}
