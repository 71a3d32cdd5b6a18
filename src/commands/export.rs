use anyhow::{Context as _, Result};
use calbill_core::invoice::export_series_batch;
use chrono::{Local, Utc};
use owo_colors::OwoColorize;

use super::{Context, create_spinner};

pub async fn run(series_ids: Vec<u64>, system: Option<String>) -> Result<()> {
    let mut ctx = Context::load()?;
    let backend = ctx.billing_system(system.as_deref())?;

    let spinner = create_spinner(format!(
        "Exporting {} series to {}",
        series_ids.len(),
        backend.kind().key()
    ));
    let result = export_series_batch(
        &mut ctx.store,
        &backend,
        &series_ids,
        Local::now().date_naive(),
        Utc::now(),
    )
    .await;
    spinner.finish_and_clear();

    // Series exported before a failure stay synchronized
    ctx.save()?;
    let results = result.context("Export stopped")?;

    for (id, invoice) in results {
        match invoice {
            Some(invoice) => println!("{} Series #{id} → invoice {invoice}", "✓".green()),
            None => println!("{} Series #{id} was already synchronized", "-".dimmed()),
        }
    }

    Ok(())
}
