use anyhow::{Context as _, Result};
use calbill_core::import::import_events;
use chrono::Utc;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::pluralize;

pub async fn run() -> Result<()> {
    let mut ctx = Context::load()?;
    let events = ctx.fetch_events().await?;

    // Appointments created before a failure are kept, so save either way
    let result = import_events(&mut ctx.store, &events, Utc::now());
    ctx.save()?;
    let stats = result.context("Import stopped")?;

    println!(
        "{} Imported {} {} ({} already imported)",
        "✓".green(),
        stats.created,
        pluralize("appointment", stats.created),
        stats.skipped
    );

    if stats.flagged > 0 {
        println!(
            "{} {} {} could not be matched and {} assigned to Default. Check `calbill series`.",
            "!".yellow(),
            stats.flagged,
            pluralize("appointment", stats.flagged),
            if stats.flagged == 1 { "was" } else { "were" }
        );
    }

    Ok(())
}
