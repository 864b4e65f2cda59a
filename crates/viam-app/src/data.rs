//! [`DataClient`] – query, tag, annotate and export captured data.
//!
//! Tabular data is structured readings (sensor values, poses, ...); binary
//! data is files (images, point clouds). Queries page with a `last` cursor:
//! pass the `last` of the previous page to get the next one, and stop when a
//! page comes back empty.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use viam_rpc::{CancelToken, Channel, ClientOptions, ResourceClient, ServiceDescriptor, collect_into};
use viam_types::{Struct, ViamError, wire};

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.app.data.v1.DataService",
    &[
        "TabularDataByFilter",
        "TabularDataBySQL",
        "BinaryDataByFilter",
        "BinaryDataByIDs",
        "DeleteTabularData",
        "DeleteBinaryDataByFilter",
        "DeleteBinaryDataByIDs",
        "AddTagsToBinaryDataByIDs",
        "RemoveTagsFromBinaryDataByIDs",
        "TagsByFilter",
        "AddBoundingBoxToImageByID",
        "RemoveBoundingBoxFromImageByID",
        "BoundingBoxLabelsByFilter",
        "GetDatabaseConnection",
        "AddBinaryDataToDatasetByIDs",
        "RemoveBinaryDataFromDatasetByIDs",
        "ExportTabularData",
    ],
);

// ─────────────────────────────────────────────────────────────────────────────
// Query types
// ─────────────────────────────────────────────────────────────────────────────

/// A closed time range. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureInterval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

/// Selects data by where and when it was captured. Empty fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub component_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub component_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub robot_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub robot_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub part_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub part_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mime_type: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<CaptureInterval>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bbox_labels: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dataset_id: String,
}

/// Identifies one binary file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinaryId {
    pub file_id: String,
    pub organization_id: String,
    pub location_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Result types
// ─────────────────────────────────────────────────────────────────────────────

/// Where and how a piece of data was captured.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureMetadata {
    pub organization_id: String,
    pub location_id: String,
    pub robot_name: String,
    pub robot_id: String,
    pub part_name: String,
    pub part_id: String,
    pub component_type: String,
    pub component_name: String,
    pub method_name: String,
    pub method_parameters: Struct,
    pub tags: Vec<String>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabularData {
    /// Index into the page's `metadata`.
    pub metadata_index: u32,
    pub data: Struct,
    pub time_requested: Option<DateTime<Utc>>,
    pub time_received: Option<DateTime<Utc>>,
}

/// One page of tabular results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TabularPage {
    pub data: Vec<TabularData>,
    #[serde(with = "wire::uint64")]
    pub count: u64,
    /// Cursor for the next page.
    pub last: String,
    pub metadata: Vec<CaptureMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundingBox {
    pub id: String,
    pub label: String,
    #[serde(with = "wire::double")]
    pub x_min_normalized: f64,
    #[serde(with = "wire::double")]
    pub y_min_normalized: f64,
    #[serde(with = "wire::double")]
    pub x_max_normalized: f64,
    #[serde(with = "wire::double")]
    pub y_max_normalized: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bboxes: Vec<BoundingBox>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinaryMetadata {
    pub id: String,
    pub capture_metadata: CaptureMetadata,
    pub time_requested: Option<DateTime<Utc>>,
    pub time_received: Option<DateTime<Utc>>,
    pub file_name: String,
    pub file_ext: String,
    pub uri: String,
    pub annotations: Annotations,
    pub dataset_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinaryData {
    /// Empty unless the query asked for binary contents.
    #[serde(with = "wire::base64_bytes")]
    pub binary: Vec<u8>,
    pub metadata: BinaryMetadata,
}

/// One page of binary results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinaryPage {
    pub data: Vec<BinaryData>,
    #[serde(with = "wire::uint64")]
    pub count: u64,
    pub last: String,
}

/// One row of an export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportedRow {
    pub organization_id: String,
    pub location_id: String,
    pub robot_id: String,
    pub robot_name: String,
    pub part_id: String,
    pub part_name: String,
    pub resource_name: String,
    pub resource_subtype: String,
    pub method_name: String,
    pub time_captured: Option<DateTime<Utc>>,
    pub method_parameters: Struct,
    pub tags: Vec<String>,
    pub payload: Struct,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DeletedCountResponse {
    #[serde(with = "wire::uint64")]
    deleted_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SqlResponse {
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TagsResponse {
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LabelsResponse {
    labels: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BoundingBoxResponse {
    bbox_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseConnectionResponse {
    hostname: String,
}

/// Client for the data service of the cloud app.
#[derive(Debug, Clone)]
pub struct DataClient {
    inner: ResourceClient,
}

impl DataClient {
    pub fn new(channel: Arc<dyn Channel>, options: ClientOptions) -> Self {
        Self {
            inner: ResourceClient::new(channel, &SERVICE, "", options),
        }
    }

    /// One page of tabular data. `limit` defaults to [`DEFAULT_PAGE_SIZE`];
    /// `last` is the cursor from the previous page (empty for the first).
    /// With `count_only` the page carries only `count`.
    pub async fn tabular_data_by_filter(
        &self,
        filter: &Filter,
        limit: Option<u64>,
        last: &str,
        count_only: bool,
    ) -> Result<TabularPage, ViamError> {
        let request = json!({
            "dataRequest": data_request(filter, limit, last),
            "countOnly": count_only,
        });
        self.inner.call("TabularDataByFilter", request).await
    }

    /// Run a SQL query over the organisation's tabular data.
    pub async fn tabular_data_by_sql(
        &self,
        organization_id: &str,
        sql_query: &str,
    ) -> Result<Vec<Value>, ViamError> {
        let request = json!({ "organizationId": organization_id, "sqlQuery": sql_query });
        let resp: SqlResponse = self.inner.call("TabularDataBySQL", request).await?;
        Ok(resp.data)
    }

    pub async fn binary_data_by_filter(
        &self,
        filter: &Filter,
        limit: Option<u64>,
        last: &str,
        include_binary: bool,
        count_only: bool,
    ) -> Result<BinaryPage, ViamError> {
        let request = json!({
            "dataRequest": data_request(filter, limit, last),
            "includeBinary": include_binary,
            "countOnly": count_only,
        });
        self.inner.call("BinaryDataByFilter", request).await
    }

    pub async fn binary_data_by_ids(
        &self,
        ids: &[BinaryId],
        include_binary: bool,
    ) -> Result<Vec<BinaryData>, ViamError> {
        let request = json!({ "binaryIds": ids, "includeBinary": include_binary });
        let resp: BinaryPage = self.inner.call("BinaryDataByIDs", request).await?;
        Ok(resp.data)
    }

    /// Delete tabular data older than `older_than_days`. Returns how many
    /// rows were deleted.
    pub async fn delete_tabular_data(
        &self,
        organization_id: &str,
        older_than_days: u32,
    ) -> Result<u64, ViamError> {
        let request = json!({
            "organizationId": organization_id,
            "deleteOlderThanDays": older_than_days,
        });
        let resp: DeletedCountResponse = self.inner.call("DeleteTabularData", request).await?;
        Ok(resp.deleted_count)
    }

    pub async fn delete_binary_data_by_filter(&self, filter: &Filter) -> Result<u64, ViamError> {
        let resp: DeletedCountResponse = self
            .inner
            .call("DeleteBinaryDataByFilter", json!({ "filter": filter }))
            .await?;
        Ok(resp.deleted_count)
    }

    pub async fn delete_binary_data_by_ids(&self, ids: &[BinaryId]) -> Result<u64, ViamError> {
        let resp: DeletedCountResponse = self
            .inner
            .call("DeleteBinaryDataByIDs", json!({ "binaryIds": ids }))
            .await?;
        Ok(resp.deleted_count)
    }

    pub async fn add_tags_to_binary_data_by_ids(
        &self,
        tags: &[&str],
        ids: &[BinaryId],
    ) -> Result<(), ViamError> {
        let request = json!({ "binaryIds": ids, "tags": tags });
        self.inner.call_empty("AddTagsToBinaryDataByIDs", request).await
    }

    /// Returns how many tags were removed.
    pub async fn remove_tags_from_binary_data_by_ids(
        &self,
        tags: &[&str],
        ids: &[BinaryId],
    ) -> Result<u64, ViamError> {
        let request = json!({ "binaryIds": ids, "tags": tags });
        let resp: DeletedCountResponse = self.inner.call("RemoveTagsFromBinaryDataByIDs", request).await?;
        Ok(resp.deleted_count)
    }

    pub async fn tags_by_filter(&self, filter: &Filter) -> Result<Vec<String>, ViamError> {
        let resp: TagsResponse = self.inner.call("TagsByFilter", json!({ "filter": filter })).await?;
        Ok(resp.tags)
    }

    /// Annotate an image with a labelled box in normalised coordinates.
    /// Returns the new box's id.
    pub async fn add_bounding_box_to_image_by_id(
        &self,
        id: &BinaryId,
        label: &str,
        x_min_normalized: f64,
        y_min_normalized: f64,
        x_max_normalized: f64,
        y_max_normalized: f64,
    ) -> Result<String, ViamError> {
        let request = json!({
            "binaryId": id,
            "label": label,
            "xMinNormalized": x_min_normalized,
            "yMinNormalized": y_min_normalized,
            "xMaxNormalized": x_max_normalized,
            "yMaxNormalized": y_max_normalized,
        });
        let resp: BoundingBoxResponse = self.inner.call("AddBoundingBoxToImageByID", request).await?;
        Ok(resp.bbox_id)
    }

    pub async fn remove_bounding_box_from_image_by_id(
        &self,
        id: &BinaryId,
        bbox_id: &str,
    ) -> Result<(), ViamError> {
        let request = json!({ "binaryId": id, "bboxId": bbox_id });
        self.inner.call_empty("RemoveBoundingBoxFromImageByID", request).await
    }

    pub async fn bounding_box_labels_by_filter(&self, filter: &Filter) -> Result<Vec<String>, ViamError> {
        let resp: LabelsResponse = self
            .inner
            .call("BoundingBoxLabelsByFilter", json!({ "filter": filter }))
            .await?;
        Ok(resp.labels)
    }

    /// Hostname of the organisation's read-only database endpoint.
    pub async fn get_database_connection(&self, organization_id: &str) -> Result<String, ViamError> {
        let resp: DatabaseConnectionResponse = self
            .inner
            .call("GetDatabaseConnection", json!({ "organizationId": organization_id }))
            .await?;
        Ok(resp.hostname)
    }

    pub async fn add_binary_data_to_dataset_by_ids(
        &self,
        ids: &[BinaryId],
        dataset_id: &str,
    ) -> Result<(), ViamError> {
        let request = json!({ "binaryIds": ids, "datasetId": dataset_id });
        self.inner.call_empty("AddBinaryDataToDatasetByIDs", request).await
    }

    pub async fn remove_binary_data_from_dataset_by_ids(
        &self,
        ids: &[BinaryId],
        dataset_id: &str,
    ) -> Result<(), ViamError> {
        let request = json!({ "binaryIds": ids, "datasetId": dataset_id });
        self.inner.call_empty("RemoveBinaryDataFromDatasetByIDs", request).await
    }

    /// Stream every row captured by one resource method within `interval`
    /// into `sink`. Returns the number of rows appended.
    #[allow(clippy::too_many_arguments)]
    pub async fn export_tabular_data(
        &self,
        part_id: &str,
        resource_name: &str,
        resource_subtype: &str,
        method_name: &str,
        interval: CaptureInterval,
        sink: &mut Vec<ExportedRow>,
        cancel: Option<CancelToken>,
    ) -> Result<usize, ViamError> {
        let request = json!({
            "partId": part_id,
            "resourceName": resource_name,
            "resourceSubtype": resource_subtype,
            "methodName": method_name,
            "interval": interval,
        });
        let stream = self.inner.stream("ExportTabularData", request).await?;
        collect_into(
            stream,
            sink,
            |chunk: Value| Ok(Some(serde_json::from_value::<ExportedRow>(chunk)?)),
            cancel,
        )
        .await
    }
}

fn data_request(filter: &Filter, limit: Option<u64>, last: &str) -> Value {
    json!({
        "filter": filter,
        "limit": limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
        "last": last,
        "sortOrder": "ORDER_UNSPECIFIED",
    })
}
