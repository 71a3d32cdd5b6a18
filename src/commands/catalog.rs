use anyhow::{Context as _, Result};
use calbill_core::catalog::{import_appointment_types, import_customers};
use clap::ValueEnum;
use owo_colors::OwoColorize;

use super::{Context, create_spinner};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CatalogKind {
    /// Contacts become customers
    Customers,
    /// Products become appointment types
    Products,
}

pub async fn run(kind: CatalogKind, system: Option<String>) -> Result<()> {
    let mut ctx = Context::load()?;
    let backend = ctx.billing_system(system.as_deref())?;

    let system_key = backend.kind().key();
    let (label, result) = match kind {
        CatalogKind::Customers => {
            let spinner = create_spinner(format!("Fetching contacts from {system_key}"));
            let result = import_customers(&mut ctx.store, &backend).await;
            spinner.finish_and_clear();
            ("customers", result)
        }
        CatalogKind::Products => {
            let spinner = create_spinner(format!("Fetching products from {system_key}"));
            let result = import_appointment_types(&mut ctx.store, &backend).await;
            spinner.finish_and_clear();
            ("appointment types", result)
        }
    };

    let stats = result.with_context(|| format!("Failed to synchronize {label}"))?;
    ctx.save()?;

    println!(
        "{} Synchronized {label}: {} new, {} updated",
        "✓".green(),
        stats.inserted,
        stats.updated
    );

    Ok(())
}
