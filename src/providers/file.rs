//! Calendar events read from a local JSON file.
//!
//! The file holds an array of events in the same shape the Google source
//! produces, which makes it handy for offline imports.

use std::path::PathBuf;

use calbill_core::{CalBillError, CalBillResult, CalendarEvent, CalendarSource};

pub struct EventFile {
    path: PathBuf,
}

impl EventFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventFile { path: path.into() }
    }
}

impl CalendarSource for EventFile {
    async fn unsynchronized_events(&self) -> CalBillResult<Vec<CalendarEvent>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;

        serde_json::from_str(&contents).map_err(|e| {
            CalBillError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }
}
