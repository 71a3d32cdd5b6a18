//! e-conomic REST client.
//!
//! Collections are paged; every list call follows `pagination.nextPage`
//! until the server stops returning one.

use calbill_core::config::EconomicConfig;
use calbill_core::{
    BillingBackend, CalBillError, CalBillResult, InvoiceDraft, RemoteContact, RemoteProduct,
};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

const BASE_URL: &str = "https://restapi.e-conomic.com/";

/// Invoices are always drafted in Danish kroner.
const CURRENCY: &str = "DKK";
const PAYMENT_TERMS_NUMBER: u32 = 1;
const VAT_ZONE_NUMBER: u32 = 1;

pub struct EconomicClient {
    http: Client,
    base_url: String,
    app_secret_token: String,
    agreement_grant_token: String,
}

#[derive(Deserialize)]
struct Collection<T> {
    collection: Vec<T>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    next_page: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductSummary {
    product_number: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetails {
    #[serde(default)]
    sales_price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerSummary {
    customer_number: i64,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Layout {
    layout_number: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftInvoice {
    draft_invoice_number: i64,
}

impl EconomicClient {
    pub fn new(config: &EconomicConfig) -> CalBillResult<Self> {
        if config.app_secret_token.is_empty() || config.agreement_grant_token.is_empty() {
            return Err(CalBillError::Config(
                "economic tokens (app_secret_token, agreement_grant_token) are not set".into(),
            ));
        }

        Ok(Self::with_base_url(
            &config.app_secret_token,
            &config.agreement_grant_token,
            config.base_url.as_deref().unwrap_or(BASE_URL),
        ))
    }

    pub fn with_base_url(
        app_secret_token: &str,
        agreement_grant_token: &str,
        base_url: &str,
    ) -> Self {
        EconomicClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_secret_token: app_secret_token.to_string(),
            agreement_grant_token: agreement_grant_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> CalBillResult<T> {
        tracing::debug!(%method, url, "e-conomic request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .header("X-AppSecretToken", &self.app_secret_token)
            .header("X-AgreementGrantToken", &self.agreement_grant_token)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CalBillError::Transport(format!("{method}: {url} failed - {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let raw_body = response.text().await.unwrap_or_default();
            return Err(CalBillError::Transport(format!(
                "{method}: {url} failed with {} - {raw_body}",
                status.as_u16()
            )));
        }

        response.json().await.map_err(|e| {
            CalBillError::Transport(format!("{method}: {url} returned an unexpected body - {e}"))
        })
    }

    /// Every item of a paged collection.
    async fn collection<T: DeserializeOwned>(&self, path: &str) -> CalBillResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path));

        while let Some(url) = next {
            let page: Collection<T> = self.send(Method::GET, &url, None).await?;
            items.extend(page.collection);
            next = page.pagination.and_then(|p| p.next_page);
        }

        Ok(items)
    }

    async fn default_layout_number(&self) -> CalBillResult<i64> {
        let layouts: Collection<Layout> = self.send(Method::GET, &self.url("layouts"), None).await?;

        layouts
            .collection
            .first()
            .map(|l| l.layout_number)
            .ok_or_else(|| {
                CalBillError::Validation("e-conomic agreement has no invoice layouts".into())
            })
    }
}

impl BillingBackend for EconomicClient {
    async fn get_products(&self) -> CalBillResult<Vec<RemoteProduct>> {
        let summaries: Vec<ProductSummary> = self.collection("products").await?;

        let mut products = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let url = self.url(&format!("products/{}", summary.product_number));
            let details: ProductDetails = self.send(Method::GET, &url, None).await?;
            products.push(RemoteProduct {
                id: summary.product_number,
                name: summary.name,
                unit_price: details.sales_price,
            });
        }

        Ok(products)
    }

    async fn get_customers(&self) -> CalBillResult<Vec<RemoteContact>> {
        let customers: Vec<CustomerSummary> = self.collection("customers").await?;

        Ok(customers
            .into_iter()
            .map(|c| RemoteContact {
                id: c.customer_number.to_string(),
                name: c.name,
            })
            .collect())
    }

    async fn export_invoice(&self, invoice: &InvoiceDraft) -> CalBillResult<String> {
        let customer_number: i64 = invoice.contact_id.trim().parse().map_err(|_| {
            CalBillError::Validation(format!(
                "e-conomic customer number must be numeric, got {:?}",
                invoice.contact_id
            ))
        })?;

        let layout_number = self.default_layout_number().await?;

        let lines: Vec<Value> = invoice
            .lines
            .iter()
            .map(|line| {
                json!({
                    "product": { "productNumber": line.product_id },
                    "quantity": line.quantity,
                    "unitNetPrice": line.unit_price,
                    "description": line.description,
                })
            })
            .collect();

        let body = json!({
            "date": invoice.date.format("%Y-%m-%d").to_string(),
            "currency": CURRENCY,
            "paymentTerms": { "paymentTermsNumber": PAYMENT_TERMS_NUMBER },
            "customer": { "customerNumber": customer_number },
            "recipient": {
                "name": invoice.customer_name,
                "vatZone": { "vatZoneNumber": VAT_ZONE_NUMBER },
            },
            "layout": { "layoutNumber": layout_number },
            "lines": lines,
        });

        let draft: DraftInvoice = self
            .send(Method::POST, &self.url("invoices/drafts"), Some(&body))
            .await?;

        Ok(draft.draft_invoice_number.to_string())
    }
}
