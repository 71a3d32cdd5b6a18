//! Calendar events as delivered by a calendar source.
//!
//! The shape follows the Google Calendar wire format: `start` and `end` each
//! carry either a `dateTime` or a date-only `date`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalBillError, CalBillResult};

/// An event from the external calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    pub fn date_time(value: impl Into<String>) -> Self {
        EventTime {
            date_time: Some(value.into()),
            date: None,
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        EventTime {
            date_time: None,
            date: Some(value.into()),
        }
    }

    /// Resolve to a timestamp, preferring `dateTime` over `date`.
    ///
    /// A bare date is midnight UTC. Timestamps without an offset are taken
    /// as UTC. Offsets that are present are kept.
    pub fn resolve(&self) -> CalBillResult<DateTime<FixedOffset>> {
        let raw = self
            .date_time
            .as_deref()
            .or(self.date.as_deref())
            .ok_or_else(|| CalBillError::InvalidEventTime("event has no date or dateTime".into()))?;

        parse_timestamp(raw)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn parse_timestamp(raw: &str) -> CalBillResult<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(utc_offset().from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_time(NaiveTime::default());
        return Ok(utc_offset().from_utc_datetime(&midnight));
    }

    Err(CalBillError::InvalidEventTime(format!(
        "could not parse '{raw}'"
    )))
}
