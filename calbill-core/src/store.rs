//! Entity store persisted as a single JSON file.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalBillError, CalBillResult};
use crate::model::{Appointment, AppointmentSeries, AppointmentType, Customer};

/// Name of the sentinel customer and appointment type used when matching fails.
pub const DEFAULT_NAME: &str = "Default";

/// All calbill entities plus the batch-run markers.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    customers: Vec<Customer>,
    #[serde(default)]
    appointment_types: Vec<AppointmentType>,
    #[serde(default)]
    series: Vec<AppointmentSeries>,
    #[serde(default)]
    appointments: Vec<Appointment>,
    /// One entry per completed appointment import
    #[serde(default)]
    appointment_imports: Vec<DateTime<Utc>>,
    /// One entry per completed invoice export batch
    #[serde(default)]
    invoice_exports: Vec<DateTime<Utc>>,
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

impl Store {
    /// Load the store from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> CalBillResult<Self> {
        if !path.exists() {
            return Ok(Store::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            CalBillError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Write the store to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> CalBillResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CalBillError::Serialization(e.to_string()))?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, path)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: u64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn customer_mut(&mut self, id: u64) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    pub fn customer_by_contact_id(&self, contact_id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.contact_id == contact_id)
    }

    /// First customer with exactly this name.
    pub fn customer_named(&self, name: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.name == name)
    }

    /// Insert a customer and return its id.
    pub fn insert_customer(
        &mut self,
        name: impl Into<String>,
        contact_id: impl Into<String>,
    ) -> u64 {
        let id = next_id(self.customers.iter().map(|c| c.id));
        self.customers.push(Customer {
            id,
            name: name.into(),
            alt_name: None,
            notes: None,
            contact_id: contact_id.into(),
        });
        id
    }

    // -------------------------------------------------------------------------
    // Appointment types
    // -------------------------------------------------------------------------

    pub fn appointment_types(&self) -> &[AppointmentType] {
        &self.appointment_types
    }

    pub fn appointment_type(&self, id: u64) -> Option<&AppointmentType> {
        self.appointment_types.iter().find(|t| t.id == id)
    }

    pub fn appointment_type_mut(&mut self, id: u64) -> Option<&mut AppointmentType> {
        self.appointment_types.iter_mut().find(|t| t.id == id)
    }

    pub fn appointment_type_by_product_id(&self, product_id: &str) -> Option<&AppointmentType> {
        self.appointment_types
            .iter()
            .find(|t| t.product_id == product_id)
    }

    /// First appointment type with exactly this name.
    pub fn appointment_type_named(&self, name: &str) -> Option<&AppointmentType> {
        self.appointment_types.iter().find(|t| t.name == name)
    }

    /// Insert an appointment type and return its id.
    pub fn insert_appointment_type(
        &mut self,
        name: impl Into<String>,
        product_id: impl Into<String>,
        price: f64,
    ) -> u64 {
        let id = next_id(self.appointment_types.iter().map(|t| t.id));
        self.appointment_types.push(AppointmentType {
            id,
            name: name.into(),
            alt_name: None,
            product_id: product_id.into(),
            price,
        });
        id
    }

    /// Create the `Default` customer and appointment type if they are missing.
    ///
    /// Returns the ids of the (possibly pre-existing) sentinels. Contact and
    /// product ids are unique, so a sentinel that would reuse one held by
    /// another entity is rejected before anything is inserted.
    pub fn ensure_defaults(
        &mut self,
        contact_id: &str,
        product_id: &str,
        price: f64,
    ) -> CalBillResult<(u64, u64)> {
        let existing_customer = self.customer_named(DEFAULT_NAME).map(|c| c.id);
        let existing_type = self.appointment_type_named(DEFAULT_NAME).map(|t| t.id);

        if existing_customer.is_none()
            && let Some(holder) = self.customer_by_contact_id(contact_id)
        {
            return Err(CalBillError::Validation(format!(
                "contact id {contact_id:?} already belongs to customer {holder}"
            )));
        }
        if existing_type.is_none()
            && let Some(holder) = self.appointment_type_by_product_id(product_id)
        {
            return Err(CalBillError::Validation(format!(
                "product id {product_id:?} already belongs to appointment type {holder}"
            )));
        }

        let customer_id = match existing_customer {
            Some(id) => id,
            None => self.insert_customer(DEFAULT_NAME, contact_id),
        };
        let type_id = match existing_type {
            Some(id) => id,
            None => self.insert_appointment_type(DEFAULT_NAME, product_id, price),
        };

        Ok((customer_id, type_id))
    }

    // -------------------------------------------------------------------------
    // Series
    // -------------------------------------------------------------------------

    /// All series, ordered by id.
    pub fn series(&self) -> &[AppointmentSeries] {
        &self.series
    }

    pub fn get_series(&self, id: u64) -> Option<&AppointmentSeries> {
        self.series.iter().find(|s| s.id == id)
    }

    pub(crate) fn create_series(&mut self, customer_id: u64) -> u64 {
        let id = next_id(self.series.iter().map(|s| s.id));
        self.series.push(AppointmentSeries {
            id,
            customer_id,
            already_synchronized: false,
        });
        id
    }

    /// Latch the synchronized flag. There is no way to clear it.
    pub(crate) fn mark_synchronized(&mut self, id: u64) -> CalBillResult<()> {
        let series = self
            .series
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CalBillError::SeriesNotFound(id))?;
        series.already_synchronized = true;
        Ok(())
    }

    /// Earliest appointment start in the series.
    pub fn series_start_date(&self, id: u64) -> Option<DateTime<FixedOffset>> {
        self.appointments_in_series(id).map(|a| a.start).min()
    }

    /// Latest appointment end in the series.
    pub fn series_end_date(&self, id: u64) -> Option<DateTime<FixedOffset>> {
        self.appointments_in_series(id).map(|a| a.end).max()
    }

    // -------------------------------------------------------------------------
    // Appointments
    // -------------------------------------------------------------------------

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn appointment(&self, id: u64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn appointments_in_series(&self, series_id: u64) -> impl Iterator<Item = &Appointment> {
        self.appointments
            .iter()
            .filter(move |a| a.series_id == series_id)
    }

    pub fn appointment_by_cal_id(&self, cal_id: &str) -> Option<&Appointment> {
        self.appointments
            .iter()
            .find(|a| a.cal_id.as_deref() == Some(cal_id))
    }

    pub(crate) fn insert_appointment(&mut self, mut appointment: Appointment) -> &Appointment {
        appointment.id = next_id(self.appointments.iter().map(|a| a.id));
        self.appointments.push(appointment);
        &self.appointments[self.appointments.len() - 1]
    }

    // -------------------------------------------------------------------------
    // Batch markers
    // -------------------------------------------------------------------------

    pub fn record_appointment_import(&mut self, at: DateTime<Utc>) {
        self.appointment_imports.push(at);
    }

    pub fn record_invoice_export(&mut self, at: DateTime<Utc>) {
        self.invoice_exports.push(at);
    }

    pub fn last_appointment_import(&self) -> Option<DateTime<Utc>> {
        self.appointment_imports.last().copied()
    }

    pub fn last_invoice_export(&self) -> Option<DateTime<Utc>> {
        self.invoice_exports.last().copied()
    }
}
