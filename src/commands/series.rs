use anyhow::Result;
use calbill_core::invoice::exportable_series;
use chrono::Utc;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::render_series;

pub async fn run() -> Result<()> {
    let ctx = Context::load()?;
    let ready = exportable_series(&ctx.store, Utc::now().date_naive());

    if ready.is_empty() {
        println!("{}", "No series ready for export".dimmed());
        return Ok(());
    }

    for series in &ready {
        println!("{}", render_series(&ctx.store, series));

        for appointment in ctx.store.appointments_in_series(series.id) {
            if let Some(note) = &appointment.system_note {
                println!("      {}", note.yellow());
            }
        }
    }

    Ok(())
}
