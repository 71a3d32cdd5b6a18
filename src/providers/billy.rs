//! Billy (billysbilling.com) REST client.

use calbill_core::config::BillyConfig;
use calbill_core::{
    BillingBackend, CalBillError, CalBillResult, InvoiceDraft, RemoteContact, RemoteProduct,
};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

const BASE_URL: &str = "https://api.billysbilling.com/v2";

pub struct BillyClient {
    http: Client,
    base_url: String,
    api_token: String,
}

#[derive(Deserialize)]
struct OrganizationResponse {
    organization: Organization,
}

#[derive(Deserialize)]
struct Organization {
    id: String,
}

#[derive(Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct Product {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPricesResponse {
    product_prices: Vec<ProductPrice>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPrice {
    unit_price: f64,
}

#[derive(Deserialize)]
struct ContactsResponse {
    contacts: Vec<Contact>,
}

#[derive(Deserialize)]
struct Contact {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct InvoicesResponse {
    invoices: Vec<CreatedInvoice>,
}

#[derive(Deserialize)]
struct CreatedInvoice {
    id: String,
}

impl BillyClient {
    pub fn new(config: &BillyConfig) -> CalBillResult<Self> {
        if config.api_token.is_empty() {
            return Err(CalBillError::Config(
                "billy.api_token is not set in config.toml".into(),
            ));
        }

        let base_url = config.base_url.as_deref().unwrap_or(BASE_URL);
        Ok(Self::with_base_url(&config.api_token, base_url))
    }

    pub fn with_base_url(api_token: &str, base_url: &str) -> Self {
        BillyClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    /// Send a request and decode the JSON response.
    ///
    /// Any status >= 400 becomes a transport error carrying the raw body.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> CalBillResult<T> {
        tracing::debug!(%method, path, "billy request");

        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header("X-Access-Token", &self.api_token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CalBillError::Transport(format!("{method}: {path} failed - {e}")))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let raw_body = response.text().await.unwrap_or_default();
            return Err(CalBillError::Transport(format!(
                "{method}: {path} failed with {status} - {raw_body}"
            )));
        }

        response.json().await.map_err(|e| {
            CalBillError::Transport(format!("{method}: {path} returned an unexpected body - {e}"))
        })
    }

    /// Id of the organization the API token belongs to.
    async fn organization_id(&self) -> CalBillResult<String> {
        let response: OrganizationResponse =
            self.request(Method::GET, "/organization", &[], None).await?;
        Ok(response.organization.id)
    }

    async fn unit_price(&self, product_id: &str) -> CalBillResult<f64> {
        let response: ProductPricesResponse = self
            .request(Method::GET, "/productPrices", &[("productId", product_id)], None)
            .await?;

        Ok(response
            .product_prices
            .first()
            .map(|p| p.unit_price)
            .unwrap_or(0.0))
    }
}

impl BillingBackend for BillyClient {
    async fn get_products(&self) -> CalBillResult<Vec<RemoteProduct>> {
        let response: ProductsResponse = self.request(Method::GET, "/products", &[], None).await?;

        let mut products = Vec::with_capacity(response.products.len());
        for product in response.products {
            let unit_price = self.unit_price(&product.id).await?;
            products.push(RemoteProduct {
                id: product.id,
                name: product.name,
                unit_price,
            });
        }

        Ok(products)
    }

    async fn get_customers(&self) -> CalBillResult<Vec<RemoteContact>> {
        let response: ContactsResponse = self.request(Method::GET, "/contacts", &[], None).await?;

        Ok(response
            .contacts
            .into_iter()
            .map(|c| RemoteContact { id: c.id, name: c.name })
            .collect())
    }

    async fn export_invoice(&self, invoice: &InvoiceDraft) -> CalBillResult<String> {
        let organization_id = self.organization_id().await?;

        let lines: Vec<Value> = invoice
            .lines
            .iter()
            .map(|line| {
                json!({
                    "productId": line.product_id,
                    "quantity": line.quantity,
                    "unitPrice": line.unit_price,
                    "description": line.description,
                })
            })
            .collect();

        let body = json!({
            "invoice": {
                "organizationId": organization_id,
                "entryDate": invoice.date.format("%Y-%m-%d").to_string(),
                "contactId": invoice.contact_id,
                "lines": lines,
            }
        });

        let response: InvoicesResponse = self
            .request(Method::POST, "/invoices", &[], Some(&body))
            .await?;

        response
            .invoices
            .into_iter()
            .next()
            .map(|created| created.id)
            .ok_or_else(|| CalBillError::Transport("POST: /invoices returned no invoice".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbill_core::InvoiceLine;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BillyClient {
        BillyClient::with_base_url("token-123", &server.uri())
    }

    #[test]
    fn test_new_requires_api_token() {
        let config = BillyConfig::default();
        assert!(matches!(BillyClient::new(&config), Err(CalBillError::Config(_))));
    }

    #[tokio::test]
    async fn test_get_products_fetches_prices() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(header("X-Access-Token", "token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [
                    {"id": "prod-1", "name": "Massage"},
                    {"id": "prod-2", "name": "Unpriced"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/productPrices"))
            .and(query_param("productId", "prod-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "productPrices": [{"unitPrice": 450.0}, {"unitPrice": 999.0}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/productPrices"))
            .and(query_param("productId", "prod-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"productPrices": []})))
            .mount(&server)
            .await;

        let products = client(&server).get_products().await.unwrap();

        assert_eq!(
            products,
            vec![
                RemoteProduct {
                    id: "prod-1".into(),
                    name: "Massage".into(),
                    unit_price: 450.0,
                },
                RemoteProduct {
                    id: "prod-2".into(),
                    name: "Unpriced".into(),
                    unit_price: 0.0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_get_customers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contacts": [{"id": "c-1", "name": "Hansen ApS", "countryId": "DK"}]
            })))
            .mount(&server)
            .await;

        let contacts = client(&server).get_customers().await.unwrap();

        assert_eq!(
            contacts,
            vec![RemoteContact {
                id: "c-1".into(),
                name: "Hansen ApS".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_error_status_reports_method_path_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = client(&server).get_customers().await.unwrap_err();

        match err {
            CalBillError::Transport(message) => {
                assert_eq!(message, "GET: /contacts failed with 401 - invalid token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_export_invoice_posts_lines() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/organization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organization": {"id": "org-9"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/invoices"))
            .and(body_partial_json(json!({
                "invoice": {
                    "organizationId": "org-9",
                    "entryDate": "2024-03-10",
                    "contactId": "c-1",
                    "lines": [{
                        "productId": "prod-1",
                        "quantity": 2,
                        "unitPrice": 100.0,
                        "description": "04-03-24 13:00, 05-03-24 10:00"
                    }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoices": [{"id": "inv-77"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let draft = InvoiceDraft {
            contact_id: "c-1".into(),
            customer_name: "Hansen ApS".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            lines: vec![InvoiceLine {
                product_id: "prod-1".into(),
                quantity: 2,
                unit_price: 100.0,
                description: "04-03-24 13:00, 05-03-24 10:00".into(),
            }],
        };

        let id = client(&server).export_invoice(&draft).await.unwrap();
        assert_eq!(id, "inv-77");
    }
}
