use anyhow::Result;
use calbill_core::store::DEFAULT_NAME;
use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use super::Context;

fn render_marker(marker: Option<DateTime<Utc>>) -> String {
    match marker {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "never".dimmed().to_string(),
    }
}

pub async fn run() -> Result<()> {
    let ctx = Context::load()?;
    let store = &ctx.store;

    let synchronized = store.series().iter().filter(|s| s.already_synchronized).count();
    let flagged = store
        .appointments()
        .iter()
        .filter(|a| a.system_note.is_some())
        .count();

    let rows = [
        ("Store", ctx.store_path.display().to_string()),
        ("Billing system", ctx.config.billing_system.clone()),
        ("Customers", store.customers().len().to_string()),
        ("Appointment types", store.appointment_types().len().to_string()),
        (
            "Series",
            format!("{} ({synchronized} synchronized)", store.series().len()),
        ),
        (
            "Appointments",
            format!("{} ({flagged} to review)", store.appointments().len()),
        ),
        ("Last import", render_marker(store.last_appointment_import())),
        ("Last export", render_marker(store.last_invoice_export())),
    ];

    for (label, value) in rows {
        println!("{:<18} {}", format!("{label}:"), value);
    }

    let has_defaults = store.customer_named(DEFAULT_NAME).is_some()
        && store.appointment_type_named(DEFAULT_NAME).is_some();
    if !has_defaults {
        println!();
        println!(
            "{} No {DEFAULT_NAME} customer/appointment type yet. Run `calbill defaults` first.",
            "!".yellow()
        );
    }

    Ok(())
}
