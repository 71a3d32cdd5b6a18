//! Seams to the outside world: billing backends and calendar sources.
//!
//! Backends speak these provider-neutral types; the HTTP clients in the CLI
//! translate them to and from each system's wire format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CalBillResult;
use crate::event::CalendarEvent;

/// A product as listed by the billing system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: String,
    pub name: String,
    pub unit_price: f64,
}

/// A customer/contact as listed by the billing system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    pub id: String,
    pub name: String,
}

/// One priced line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub description: String,
}

/// An invoice ready to be submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub contact_id: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub lines: Vec<InvoiceLine>,
}

/// An external billing system.
#[allow(async_fn_in_trait)]
pub trait BillingBackend {
    async fn get_products(&self) -> CalBillResult<Vec<RemoteProduct>>;

    async fn get_customers(&self) -> CalBillResult<Vec<RemoteContact>>;

    /// Submit an invoice and return the id the backend assigned to it.
    async fn export_invoice(&self, invoice: &InvoiceDraft) -> CalBillResult<String>;
}

/// An external calendar.
#[allow(async_fn_in_trait)]
pub trait CalendarSource {
    async fn unsynchronized_events(&self) -> CalBillResult<Vec<CalendarEvent>>;
}
