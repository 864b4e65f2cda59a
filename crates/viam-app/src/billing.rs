//! [`BillingClient`] – usage, invoices and billing details of an
//! organisation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use viam_rpc::{CancelToken, Channel, ClientOptions, ResourceClient, ServiceDescriptor, concat_bytes};
use viam_types::{ViamError, wire};

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.app.v1.BillingService",
    &[
        "GetCurrentMonthUsage",
        "GetOrgBillingInformation",
        "GetInvoicesSummary",
        "GetInvoicePdf",
        "SendPaymentRequiredEmail",
    ],
);

/// Month-to-date usage, in the organisation's billing currency.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentMonthUsage {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(with = "wire::double")]
    pub cloud_storage_usage_cost: f64,
    #[serde(with = "wire::double")]
    pub data_upload_usage_cost: f64,
    #[serde(with = "wire::double")]
    pub data_egress_usage_cost: f64,
    #[serde(with = "wire::double")]
    pub remote_control_usage_cost: f64,
    #[serde(with = "wire::double")]
    pub standard_compute_usage_cost: f64,
    #[serde(with = "wire::double")]
    pub discount_amount: f64,
    #[serde(with = "wire::double")]
    pub total_usage_with_discount: f64,
    #[serde(with = "wire::double")]
    pub total_usage_without_discount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PaymentMethodType {
    #[default]
    #[serde(rename = "PAYMENT_METHOD_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PAYMENT_METHOD_TYPE_CARD")]
    Card,
    #[serde(rename = "PAYMENT_METHOD_TYPE_USBANKACCOUNT")]
    UsBankAccount,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentMethodCard {
    pub brand: String,
    pub digits: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BillingInformation {
    #[serde(rename = "type")]
    pub kind: PaymentMethodType,
    pub billing_email: String,
    pub method: Option<PaymentMethodCard>,
    pub billing_tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub invoice_date: Option<DateTime<Utc>>,
    #[serde(with = "wire::double")]
    pub invoice_amount: f64,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoicesSummary {
    #[serde(with = "wire::double")]
    pub outstanding_balance: f64,
    pub invoices: Vec<InvoiceSummary>,
}

/// Client for the billing service of the cloud app.
#[derive(Debug, Clone)]
pub struct BillingClient {
    inner: ResourceClient,
}

impl BillingClient {
    pub fn new(channel: Arc<dyn Channel>, options: ClientOptions) -> Self {
        Self {
            inner: ResourceClient::new(channel, &SERVICE, "", options),
        }
    }

    pub async fn get_current_month_usage(&self, org_id: &str) -> Result<CurrentMonthUsage, ViamError> {
        self.inner
            .call("GetCurrentMonthUsage", json!({ "orgId": org_id }))
            .await
    }

    pub async fn get_org_billing_information(&self, org_id: &str) -> Result<BillingInformation, ViamError> {
        self.inner
            .call("GetOrgBillingInformation", json!({ "orgId": org_id }))
            .await
    }

    pub async fn get_invoices_summary(&self, org_id: &str) -> Result<InvoicesSummary, ViamError> {
        self.inner
            .call("GetInvoicesSummary", json!({ "orgId": org_id }))
            .await
    }

    /// The invoice as a complete PDF document.
    ///
    /// # Errors
    ///
    /// [`ViamError::Cancelled`] if `cancel` fires before the download
    /// completes; stream failures unchanged.
    pub async fn get_invoice_pdf(
        &self,
        invoice_id: &str,
        org_id: &str,
        cancel: Option<CancelToken>,
    ) -> Result<Vec<u8>, ViamError> {
        let request = json!({ "id": invoice_id, "orgId": org_id });
        let stream = self.inner.stream("GetInvoicePdf", request).await?;
        concat_bytes(stream, "chunk", cancel).await
    }

    pub async fn send_payment_required_email(
        &self,
        customer_org_id: &str,
        billing_owner_org_id: &str,
    ) -> Result<(), ViamError> {
        let request = json!({
            "customerOrgId": customer_org_id,
            "billingOwnerOrgId": billing_owner_org_id,
        });
        self.inner.call_empty("SendPaymentRequiredEmail", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock;
    use viam_types::wire;

    const ROUTE: &str = "/viam.app.v1.BillingService";

    #[tokio::test]
    async fn invoice_pdf_chunks_are_joined_in_order() {
        let mock = mock();
        mock.stream(
            &format!("{ROUTE}/GetInvoicePdf"),
            vec![
                Ok(json!({ "chunk": wire::encode_bytes(b"%PDF-1.7\n") })),
                Ok(json!({ "chunk": wire::encode_bytes(b"1 0 obj\n") })),
                Ok(json!({ "chunk": wire::encode_bytes(b"%%EOF") })),
            ],
        );
        let billing = BillingClient::new(mock.clone(), ClientOptions::default());

        let pdf = billing.get_invoice_pdf("inv-1", "org-1", None).await.unwrap();

        assert_eq!(pdf, b"%PDF-1.7\n1 0 obj\n%%EOF");
        assert_eq!(
            mock.last_request(),
            Some(json!({ "id": "inv-1", "orgId": "org-1" }))
        );
    }

    #[tokio::test]
    async fn invoices_summary_decodes_dates() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetInvoicesSummary"),
            json!({
                "outstandingBalance": 12.5,
                "invoices": [{ "id": "inv-1", "invoiceAmount": 12.5, "status": "outstanding",
                               "dueDate": "2024-07-01T00:00:00Z" }]
            }),
        );
        let billing = BillingClient::new(mock.clone(), ClientOptions::default());

        let summary = billing.get_invoices_summary("org-1").await.unwrap();
        assert_eq!(summary.outstanding_balance, 12.5);
        assert_eq!(summary.invoices[0].status, "outstanding");
        assert!(summary.invoices[0].due_date.is_some());
        assert!(summary.invoices[0].paid_date.is_none());
    }

    #[tokio::test]
    async fn billing_information_card() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetOrgBillingInformation"),
            json!({
                "type": "PAYMENT_METHOD_TYPE_CARD",
                "billingEmail": "ops@example.com",
                "method": { "brand": "visa", "digits": "4242" }
            }),
        );
        let billing = BillingClient::new(mock.clone(), ClientOptions::default());

        let info = billing.get_org_billing_information("org-1").await.unwrap();
        assert_eq!(info.kind, PaymentMethodType::Card);
        assert_eq!(info.method.map(|m| m.digits), Some("4242".to_string()));
    }

    #[tokio::test]
    async fn usage_and_email() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/GetCurrentMonthUsage"),
            json!({ "totalUsageWithDiscount": 3.25, "cloudStorageUsageCost": 1.0 }),
        );
        let billing = BillingClient::new(mock.clone(), ClientOptions::default());

        let usage = billing.get_current_month_usage("org-1").await.unwrap();
        assert_eq!(usage.total_usage_with_discount, 3.25);

        billing.send_payment_required_email("cust", "owner").await.unwrap();
        assert_eq!(
            mock.last_request(),
            Some(json!({ "customerOrgId": "cust", "billingOwnerOrgId": "owner" }))
        );
    }
}
