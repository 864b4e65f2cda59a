//! [`DataManagerClient`] – triggers an immediate sync of captured data.

use serde_json::json;
use viam_rpc::ServiceDescriptor;
use viam_types::{Struct, ViamError, wire};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.service.datamanager.v1.DataManagerService",
    &["Sync", "DoCommand"],
);

viam_rpc::resource_adapter! {
    pub struct DataManagerClient => SERVICE;
}

impl DataManagerClient {
    /// Upload everything captured so far without waiting for the next
    /// scheduled sync.
    pub async fn sync(&self, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({ "name": self.name(), "extra": wire::extra(extra) });
        self.inner.call_empty("Sync", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock;
    use viam_rpc::ClientOptions;

    #[tokio::test]
    async fn sync_sends_name_and_extra() {
        let mock = mock();
        let dm = DataManagerClient::new(mock.clone(), "data_manager-1", ClientOptions::default());
        dm.sync(None).await.unwrap();
        assert_eq!(
            mock.last_request(),
            Some(json!({ "name": "data_manager-1", "extra": {} }))
        );
    }
}
