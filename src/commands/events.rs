use anyhow::Result;
use calbill_core::import::unimported_events;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::{Render, pluralize};

pub async fn run() -> Result<()> {
    let ctx = Context::load()?;
    let events = ctx.fetch_events().await?;
    let pending = unimported_events(&ctx.store, &events);

    if pending.is_empty() {
        println!("{}", "No new events".dimmed());
        return Ok(());
    }

    for event in &pending {
        println!("{}", event.render());
    }

    println!();
    println!(
        "{} new {}. Run `calbill import` to import them.",
        pending.len(),
        pluralize("event", pending.len())
    );

    Ok(())
}
