//! Assigning appointments to series.
//!
//! An appointment joins an existing series of the same customer when that
//! series already holds an appointment starting on the same calendar day or
//! the day before. Only start dates take part in the comparison.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{CalBillError, CalBillResult};
use crate::model::Appointment;
use crate::store::Store;

/// Input for [`add_appointment`].
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub customer_id: u64,
    pub type_id: u64,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub system_note: Option<String>,
    pub cal_id: Option<String>,
}

/// Lowest-id series of `customer_id` with an appointment starting on
/// `date` or the day before.
pub fn find_adjacent_series(store: &Store, customer_id: u64, date: NaiveDate) -> Option<u64> {
    let earliest = date.pred_opt().unwrap_or(date);

    store
        .series()
        .iter()
        .filter(|s| s.customer_id == customer_id)
        .find(|s| {
            store.appointments_in_series(s.id).any(|a| {
                let day = a.start.date_naive();
                day >= earliest && day <= date
            })
        })
        .map(|s| s.id)
}

/// Attach a new appointment to an adjacent series, creating one if needed.
pub fn add_appointment(store: &mut Store, new: NewAppointment) -> CalBillResult<&Appointment> {
    if store.customer(new.customer_id).is_none() {
        return Err(CalBillError::CustomerNotFound(new.customer_id));
    }
    if store.appointment_type(new.type_id).is_none() {
        return Err(CalBillError::AppointmentTypeNotFound(new.type_id));
    }

    let series_id = match find_adjacent_series(store, new.customer_id, new.start.date_naive()) {
        Some(id) => id,
        None => {
            let id = store.create_series(new.customer_id);
            tracing::info!(series = id, customer = new.customer_id, "created series");
            id
        }
    };

    let appointment = store.insert_appointment(Appointment {
        id: 0,
        series_id,
        type_id: new.type_id,
        start: new.start,
        end: new.end,
        cal_id: new.cal_id,
        system_note: new.system_note,
    });
    tracing::info!(
        appointment = appointment.id,
        series = series_id,
        start = %appointment.start,
        "added appointment"
    );

    Ok(appointment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        store: Store,
        customer: u64,
        kind: u64,
    }

    fn fixture() -> Fixture {
        let mut store = Store::default();
        let customer = store.insert_customer("Test customer", "c-1");
        let kind = store.insert_appointment_type("Test type", "p-1", 100.0);
        Fixture {
            store,
            customer,
            kind,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2020, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn add(f: &mut Fixture, customer: u64, start: DateTime<FixedOffset>) -> u64 {
        add_appointment(
            &mut f.store,
            NewAppointment {
                customer_id: customer,
                type_id: f.kind,
                start,
                end: start + Duration::hours(2),
                system_note: None,
                cal_id: None,
            },
        )
        .unwrap()
        .series_id
    }

    #[test]
    fn test_new_series() {
        let mut f = fixture();
        let customer = f.customer;
        let series = add(&mut f, customer, at(1, 12, 0));

        let series = f.store.get_series(series).unwrap();
        assert_eq!(series.customer_id, f.customer);
        assert!(!series.already_synchronized);
    }

    #[test]
    fn test_same_day_joins_series() {
        let mut f = fixture();
        let customer = f.customer;
        let a = add(&mut f, customer, at(1, 9, 0));
        let b = add(&mut f, customer, at(1, 18, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_next_day_joins_series() {
        let mut f = fixture();
        let customer = f.customer;
        let a = add(&mut f, customer, at(1, 12, 0));
        let b = add(&mut f, customer, at(2, 12, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_start_new_series_if_too_distant() {
        let mut f = fixture();
        let customer = f.customer;
        let a = add(&mut f, customer, at(1, 12, 0));
        let b = add(&mut f, customer, at(3, 12, 0));
        assert_ne!(a, b);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_adjacency_uses_calendar_dates() {
        let mut f = fixture();
        let customer = f.customer;
        // 23:59 and 00:01 the next day are adjacent
        let a = add(&mut f, customer, at(1, 23, 59));
        let b = add(&mut f, customer, at(2, 0, 1));
        assert_eq!(a, b);

        // Under 48 hours later but two calendar days on: new series
        let c = add(&mut f, customer, at(4, 0, 0));
        assert_ne!(b, c);
    }

    #[test]
    fn test_earlier_appointment_does_not_join_later_series() {
        let mut f = fixture();
        let customer = f.customer;
        // Window only looks backwards from the new start date
        let a = add(&mut f, customer, at(5, 12, 0));
        let b = add(&mut f, customer, at(4, 12, 0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_other_customers_series_are_ignored() {
        let mut f = fixture();
        let first = f.customer;
        let second = f.store.insert_customer("Other", "c-2");
        let a = add(&mut f, first, at(1, 12, 0));
        let b = add(&mut f, second, at(1, 13, 0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_lowest_id_series_wins() {
        let mut f = fixture();
        let customer = f.customer;
        let a = add(&mut f, customer, at(1, 12, 0));
        let b = add(&mut f, customer, at(3, 12, 0));
        assert_eq!(add(&mut f, customer, at(2, 12, 0)), a);

        // Day 3 now has day-2 (series a) and day-3 (series b) neighbours
        let c = add(&mut f, customer, at(3, 18, 0));
        assert_ne!(a, b);
        assert_eq!(c, a);
    }

    #[test]
    fn test_unknown_customer_is_rejected() {
        let mut f = fixture();
        let kind = f.kind;
        let result = add_appointment(
            &mut f.store,
            NewAppointment {
                customer_id: 99,
                type_id: kind,
                start: at(1, 12, 0),
                end: at(1, 13, 0),
                system_note: None,
                cal_id: None,
            },
        );
        assert!(matches!(result, Err(CalBillError::CustomerNotFound(99))));
        assert!(f.store.series().is_empty());
    }
}
