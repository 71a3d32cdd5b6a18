//! Turning calendar events into appointments.

use chrono::{DateTime, Utc};

use crate::error::CalBillResult;
use crate::event::CalendarEvent;
use crate::matcher::{find_appointment_type, find_customer};
use crate::model::Appointment;
use crate::series::{NewAppointment, add_appointment};
use crate::store::Store;

/// Outcome of a batch import.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportStats {
    pub created: usize,
    /// Events that were already imported
    pub skipped: usize,
    /// Created appointments that carry a system note
    pub flagged: usize,
}

/// Import a single event.
///
/// Returns `None` when an appointment with this event id already exists.
/// Existing appointments are never updated, even if the event changed.
pub fn import_event(
    store: &mut Store,
    event: &CalendarEvent,
) -> CalBillResult<Option<Appointment>> {
    if store.appointment_by_cal_id(&event.id).is_some() {
        tracing::debug!(id = %event.id, "event already imported");
        return Ok(None);
    }

    let customer = find_customer(store, &event.summary)?;
    let kind = find_appointment_type(store, &event.summary, event.description.as_deref())?;

    let notes: Vec<String> = [customer.note, kind.note].into_iter().flatten().collect();
    let system_note = if notes.is_empty() {
        None
    } else {
        Some(notes.join(" - "))
    };

    let new = NewAppointment {
        customer_id: customer.entity.id,
        type_id: kind.entity.id,
        start: event.start.resolve()?,
        end: event.end.resolve()?,
        system_note,
        cal_id: Some(event.id.clone()),
    };

    Ok(Some(add_appointment(store, new)?.clone()))
}

/// Events whose id has not been imported yet.
pub fn unimported_events<'a>(store: &Store, events: &'a [CalendarEvent]) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|e| store.appointment_by_cal_id(&e.id).is_none())
        .collect()
}

/// Import every event in order and record the import time.
///
/// The first failing event aborts the batch; appointments created before it
/// stay in the store.
pub fn import_events(
    store: &mut Store,
    events: &[CalendarEvent],
    now: DateTime<Utc>,
) -> CalBillResult<ImportStats> {
    let mut stats = ImportStats::default();

    for event in events {
        match import_event(store, event)? {
            Some(appointment) => {
                stats.created += 1;
                if appointment.system_note.is_some() {
                    stats.flagged += 1;
                }
            }
            None => stats.skipped += 1,
        }
    }

    store.record_appointment_import(now);
    tracing::info!(
        created = stats.created,
        skipped = stats.skipped,
        flagged = stats.flagged,
        "imported calendar events"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalBillError;
    use crate::event::EventTime;
    use crate::store::DEFAULT_NAME;
    use chrono::{FixedOffset, TimeZone};

    fn store() -> Store {
        let mut store = Store::default();
        store.insert_customer("Test customer", "c-1");
        store.insert_appointment_type("Test type", "p-1", 100.0);
        store.ensure_defaults("0", "0", 0.0).unwrap();
        store
    }

    fn event(id: &str, summary: &str, description: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: summary.to_string(),
            description: description.map(String::from),
            start: EventTime::date("2023-12-13T01:30:00+01:00"),
            end: EventTime::date("2023-12-13T02:30:00+01:00"),
        }
    }

    #[test]
    fn test_good_match() {
        let mut store = store();
        let event = event(
            "3dj2sa3evd926mgqpk3n4ui9ng",
            "Noget der matcher Test customer",
            Some("Noget der matcher Test type og/eller Test customer"),
        );

        let appointment = import_event(&mut store, &event).unwrap().unwrap();

        let tz = FixedOffset::east_opt(3600).unwrap();
        let series = store.get_series(appointment.series_id).unwrap();
        assert_eq!(store.customer(series.customer_id).unwrap().name, "Test customer");
        assert_eq!(store.appointment_type(appointment.type_id).unwrap().name, "Test type");
        assert_eq!(appointment.start, tz.with_ymd_and_hms(2023, 12, 13, 1, 30, 0).unwrap());
        assert_eq!(appointment.end, tz.with_ymd_and_hms(2023, 12, 13, 2, 30, 0).unwrap());
        assert_eq!(appointment.cal_id.as_deref(), Some("3dj2sa3evd926mgqpk3n4ui9ng"));
        assert_eq!(appointment.system_note, None);
    }

    #[test]
    fn test_unmatched_customer_uses_default() {
        let mut store = store();
        let event = event("e1", "qqqq", Some("Test type"));

        let appointment = import_event(&mut store, &event).unwrap().unwrap();

        let series = store.get_series(appointment.series_id).unwrap();
        assert_eq!(store.customer(series.customer_id).unwrap().name, DEFAULT_NAME);
        assert_eq!(store.appointment_type(appointment.type_id).unwrap().name, "Test type");
        assert_eq!(
            appointment.system_note.as_deref(),
            Some("Could not match customer (input was \"qqqq\")")
        );
    }

    #[test]
    fn test_both_unmatched_notes_are_combined() {
        let mut store = store();
        let event = event("e1", "qqqq", Some("wwww"));

        let appointment = import_event(&mut store, &event).unwrap().unwrap();
        assert_eq!(
            appointment.system_note.as_deref(),
            Some(
                "Could not match customer (input was \"qqqq\") - \
                 Could not match appointment type (input was \"wwww\")"
            )
        );
    }

    #[test]
    fn test_reimport_is_noop() {
        let mut store = store();
        let first = event("e1", "Test customer", Some("Test type"));
        let mut changed = first.clone();
        changed.summary = "Something else entirely".to_string();

        assert!(import_event(&mut store, &first).unwrap().is_some());
        assert!(import_event(&mut store, &changed).unwrap().is_none());

        assert_eq!(store.appointments().len(), 1);
        assert_eq!(store.appointments()[0].system_note, None);
    }

    #[test]
    fn test_missing_default_fails() {
        let mut store = Store::default();
        store.insert_appointment_type("Test type", "p-1", 100.0);

        let result = import_event(&mut store, &event("e1", "qqqq", Some("Test type")));
        assert!(matches!(result, Err(CalBillError::MissingDefault("customer"))));
        assert!(store.appointments().is_empty());
    }

    #[test]
    fn test_date_only_event() {
        let mut store = store();
        let mut event = event("e1", "Test customer", Some("Test type"));
        event.start = EventTime::date("2024-03-01");
        event.end = EventTime::date("2024-03-02");

        let appointment = import_event(&mut store, &event).unwrap().unwrap();
        assert_eq!(appointment.start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(appointment.end.to_rfc3339(), "2024-03-02T00:00:00+00:00");
    }

    #[test]
    fn test_unimported_events() {
        let mut store = store();
        let events = vec![
            event("e1", "Test customer", None),
            event("e2", "Test customer", None),
        ];
        import_event(&mut store, &events[0]).unwrap();

        let pending = unimported_events(&store, &events);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "e2");
    }

    #[test]
    fn test_import_events_counts_and_records_marker() {
        let mut store = store();
        let events = vec![
            event("e1", "Test customer", Some("Test type")),
            event("e1", "Test customer", Some("Test type")),
            event("e2", "qqqq", Some("Test type")),
        ];
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let stats = import_events(&mut store, &events, now).unwrap();

        assert_eq!(
            stats,
            ImportStats {
                created: 2,
                skipped: 1,
                flagged: 1,
            }
        );
        assert_eq!(store.last_appointment_import(), Some(now));
    }
}
