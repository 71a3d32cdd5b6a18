use anyhow::{Context as _, Result};
use calbill_core::store::DEFAULT_NAME;
use owo_colors::OwoColorize;

use super::Context;

/// Create the fallback customer and appointment type unmatched events land on.
pub async fn run(contact_id: String, product_id: String, price: f64) -> Result<()> {
    let mut ctx = Context::load()?;

    let (customer_id, type_id) = ctx
        .store
        .ensure_defaults(&contact_id, &product_id, price)
        .context("Failed to create Default sentinels")?;
    ctx.save()?;

    println!(
        "{} {DEFAULT_NAME} customer #{customer_id} (contact {contact_id})",
        "✓".green()
    );
    println!(
        "{} {DEFAULT_NAME} appointment type #{type_id} (product {product_id})",
        "✓".green()
    );

    Ok(())
}
