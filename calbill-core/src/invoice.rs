//! Building invoices from series and exporting them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::billing::{BillingBackend, InvoiceDraft, InvoiceLine};
use crate::error::{CalBillError, CalBillResult};
use crate::model::{Appointment, AppointmentSeries, AppointmentType};
use crate::store::Store;

/// Format used for appointment start times in line descriptions.
pub const LINE_TIME_FORMAT: &str = "%d-%m-%y %H:%M";

/// Build the invoice for a series without submitting it.
///
/// Appointments are sorted by type name and consecutive runs with the same
/// name become one line each.
pub fn build_invoice(
    store: &Store,
    series_id: u64,
    date: NaiveDate,
) -> CalBillResult<InvoiceDraft> {
    let series = store
        .get_series(series_id)
        .ok_or(CalBillError::SeriesNotFound(series_id))?;
    let customer = store
        .customer(series.customer_id)
        .ok_or(CalBillError::CustomerNotFound(series.customer_id))?;

    let mut rows: Vec<(&AppointmentType, &Appointment)> = store
        .appointments_in_series(series_id)
        .map(|a| {
            store
                .appointment_type(a.type_id)
                .map(|t| (t, a))
                .ok_or(CalBillError::AppointmentTypeNotFound(a.type_id))
        })
        .collect::<CalBillResult<_>>()?;
    rows.sort_by(|(ta, a), (tb, b)| ta.name.cmp(&tb.name).then(a.id.cmp(&b.id)));

    let lines = rows
        .chunk_by(|(ta, _), (tb, _)| ta.name == tb.name)
        .map(|group| {
            let (kind, _) = group[0];
            let starts: Vec<String> = group
                .iter()
                .map(|(_, a)| a.start.format(LINE_TIME_FORMAT).to_string())
                .collect();

            InvoiceLine {
                product_id: kind.product_id.clone(),
                quantity: group.len() as u32,
                unit_price: kind.price,
                description: starts.join(", "),
            }
        })
        .collect();

    Ok(InvoiceDraft {
        contact_id: customer.contact_id.clone(),
        customer_name: customer.name.clone(),
        date,
        lines,
    })
}

/// Export a series through `backend` and latch its synchronized flag.
///
/// Returns `None` without contacting the backend when the series was
/// already synchronized. On failure the flag is left unset.
pub async fn export_series<B: BillingBackend>(
    store: &mut Store,
    backend: &B,
    series_id: u64,
    today: NaiveDate,
) -> CalBillResult<Option<String>> {
    let series = store
        .get_series(series_id)
        .ok_or(CalBillError::SeriesNotFound(series_id))?;
    if series.already_synchronized {
        tracing::debug!(series = series_id, "series already synchronized");
        return Ok(None);
    }

    let draft = build_invoice(store, series_id, today)?;
    let invoice_id = backend.export_invoice(&draft).await?;

    store.mark_synchronized(series_id)?;
    tracing::info!(
        series = series_id,
        invoice = %invoice_id,
        lines = draft.lines.len(),
        "exported invoice"
    );

    Ok(Some(invoice_id))
}

/// Export several series in order and record the export time.
///
/// Stops at the first failure. Series exported before it stay synchronized.
pub async fn export_series_batch<B: BillingBackend>(
    store: &mut Store,
    backend: &B,
    series_ids: &[u64],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CalBillResult<Vec<(u64, Option<String>)>> {
    let mut results = Vec::with_capacity(series_ids.len());

    for &id in series_ids {
        let invoice_id = export_series(store, backend, id, today).await?;
        results.push((id, invoice_id));
    }

    store.record_invoice_export(now);
    Ok(results)
}

/// Unsynchronized series whose last appointment ended by midnight UTC of
/// the day before `today`.
pub fn exportable_series(store: &Store, today: NaiveDate) -> Vec<&AppointmentSeries> {
    let Some(cutoff) = today.pred_opt() else {
        return Vec::new();
    };
    let cutoff = cutoff.and_time(NaiveTime::default()).and_utc();

    store
        .series()
        .iter()
        .filter(|s| !s.already_synchronized)
        .filter(|s| {
            store
                .series_end_date(s.id)
                .is_some_and(|end| end.with_timezone(&Utc) <= cutoff)
        })
        .collect()
}
