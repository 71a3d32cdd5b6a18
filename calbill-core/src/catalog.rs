//! Synchronizing customers and appointment types from a billing system.
//!
//! Rows are keyed on the billing system's id. Known rows get their name (and
//! price, for appointment types) overwritten; unknown ones are inserted.
//! Nothing is ever removed.

use crate::billing::{BillingBackend, RemoteContact, RemoteProduct};
use crate::error::CalBillResult;
use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
}

pub fn upsert_appointment_types(store: &mut Store, products: Vec<RemoteProduct>) -> UpsertStats {
    let mut stats = UpsertStats::default();

    for product in products {
        let existing = store.appointment_type_by_product_id(&product.id).map(|t| t.id);
        match existing.and_then(|id| store.appointment_type_mut(id)) {
            Some(kind) => {
                kind.name = product.name;
                kind.price = product.unit_price;
                stats.updated += 1;
            }
            None => {
                store.insert_appointment_type(product.name, product.id, product.unit_price);
                stats.inserted += 1;
            }
        }
    }

    stats
}

pub fn upsert_customers(store: &mut Store, contacts: Vec<RemoteContact>) -> UpsertStats {
    let mut stats = UpsertStats::default();

    for contact in contacts {
        let existing = store.customer_by_contact_id(&contact.id).map(|c| c.id);
        match existing.and_then(|id| store.customer_mut(id)) {
            Some(customer) => {
                customer.name = contact.name;
                stats.updated += 1;
            }
            None => {
                store.insert_customer(contact.name, contact.id);
                stats.inserted += 1;
            }
        }
    }

    stats
}

/// Fetch every product from `backend` and upsert them as appointment types.
pub async fn import_appointment_types<B: BillingBackend>(
    store: &mut Store,
    backend: &B,
) -> CalBillResult<UpsertStats> {
    let products = backend.get_products().await?;
    let stats = upsert_appointment_types(store, products);
    tracing::info!(
        inserted = stats.inserted,
        updated = stats.updated,
        "synchronized appointment types"
    );
    Ok(stats)
}

/// Fetch every contact from `backend` and upsert them as customers.
pub async fn import_customers<B: BillingBackend>(
    store: &mut Store,
    backend: &B,
) -> CalBillResult<UpsertStats> {
    let contacts = backend.get_customers().await?;
    let stats = upsert_customers(store, contacts);
    tracing::info!(inserted = stats.inserted, updated = stats.updated, "synchronized customers");
    Ok(stats)
}
