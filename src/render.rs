//! Colored terminal rendering for calbill types.

use calbill_core::{AppointmentSeries, CalendarEvent, Store};
use owo_colors::OwoColorize;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let start = match self.start.resolve() {
            Ok(start) => start.format(TIME_FORMAT).to_string(),
            Err(_) => "????-??-?? ??:??".to_string(),
        };
        let summary = if self.summary.is_empty() { "(no title)" } else { &self.summary };

        match &self.description {
            Some(description) => {
                format!("   {} {} {}", start.dimmed(), summary, description.dimmed())
            }
            None => format!("   {} {}", start.dimmed(), summary),
        }
    }
}

/// One line per series: id, customer, date span and appointment count.
pub fn render_series(store: &Store, series: &AppointmentSeries) -> String {
    let customer = store
        .customer(series.customer_id)
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("customer #{}", series.customer_id));

    let span = match (store.series_start_date(series.id), store.series_end_date(series.id)) {
        (Some(start), Some(end)) => format!(
            "{} → {}",
            start.format(TIME_FORMAT),
            end.format(TIME_FORMAT)
        ),
        _ => "(empty)".to_string(),
    };

    let count = store.appointments_in_series(series.id).count();
    let flagged = store
        .appointments_in_series(series.id)
        .filter(|a| a.system_note.is_some())
        .count();

    let mut line = format!(
        "   {} {} {} ({} {})",
        format!("#{}", series.id).bold(),
        customer,
        span.dimmed(),
        count,
        pluralize("appointment", count)
    );
    if flagged > 0 {
        line.push_str(&format!(" {}", format!("[{flagged} to review]").yellow()));
    }
    line
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
