//! `viam-app` – typed clients for the cloud app: fleet management, captured
//! data and billing.
//!
//! These are not machine resources. Their clients carry no resource name
//! and have no `do_command`.
//!
//! # Modules
//!
//! - [`app`] – organisations, locations, machines, parts and part logs.
//! - [`data`] – tabular and binary data queries, tags, bounding boxes,
//!   datasets and tabular export.
//! - [`billing`] – usage, invoices and billing details.

pub mod app;
pub mod billing;
pub mod data;

pub use app::{AppClient, Location, LogEntry, Organization, Robot, RobotPart, RobotPartHistoryEntry};
pub use billing::{BillingClient, BillingInformation, CurrentMonthUsage, InvoicesSummary};
pub use data::{
    BinaryData, BinaryId, BinaryPage, CaptureInterval, DEFAULT_PAGE_SIZE, DataClient, ExportedRow, Filter,
    TabularData, TabularPage,
};
