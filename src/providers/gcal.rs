//! Google Calendar event source.
//!
//! Reads expanded (single) events from one calendar over the v3 REST API
//! with a bearer access token.

use calbill_core::config::CalendarConfig;
use calbill_core::{CalBillError, CalBillResult, CalendarEvent, CalendarSource, EventTime};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const PAGE_SIZE: &str = "250";

pub struct GoogleCalendar {
    http: Client,
    base_url: String,
    calendar_id: String,
    access_token: String,
    lookback_days: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    summary: String,
    description: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

impl GoogleEvent {
    /// Cancelled events and events missing an id or times are dropped.
    fn into_calendar_event(self) -> Option<CalendarEvent> {
        if self.id.is_empty() || self.status == "cancelled" {
            return None;
        }

        Some(CalendarEvent {
            id: self.id,
            summary: self.summary,
            description: self.description.filter(|d| !d.is_empty()),
            start: self.start?,
            end: self.end?,
        })
    }
}

impl GoogleCalendar {
    pub fn new(config: &CalendarConfig) -> CalBillResult<Self> {
        if config.access_token.is_empty() {
            return Err(CalBillError::Config(
                "calendar.access_token is not set in config.toml".into(),
            ));
        }

        Ok(GoogleCalendar {
            http: Client::new(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            calendar_id: config.calendar_id.clone(),
            access_token: config.access_token.clone(),
            lookback_days: config.lookback_days,
        })
    }

    fn events_url(&self) -> CalBillResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CalBillError::Config(format!("Invalid calendar base_url: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| CalBillError::Config("calendar base_url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);

        Ok(url)
    }

    /// Events from `since` onwards, across every page.
    pub async fn events_since(&self, since: DateTime<Utc>) -> CalBillResult<Vec<CalendarEvent>> {
        let url = self.events_url()?;
        let time_min = since.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("singleEvents", "true"),
                ("timeMin", time_min.as_str()),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            tracing::debug!(
                calendar = %self.calendar_id,
                page = ?page_token,
                "fetching calendar events"
            );

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await
                .map_err(|e| CalBillError::Transport(format!("GET: {url} failed - {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let raw_body = response.text().await.unwrap_or_default();
                return Err(CalBillError::Transport(format!(
                    "GET: {url} failed with {} - {raw_body}",
                    status.as_u16()
                )));
            }

            let page: EventsPage = response.json().await.map_err(|e| {
                CalBillError::Transport(format!("GET: {url} returned an unexpected body - {e}"))
            })?;

            events.extend(page.items.into_iter().filter_map(GoogleEvent::into_calendar_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }
}

impl CalendarSource for GoogleCalendar {
    async fn unsynchronized_events(&self) -> CalBillResult<Vec<CalendarEvent>> {
        self.events_since(Utc::now() - Duration::days(self.lookback_days))
            .await
    }
}
