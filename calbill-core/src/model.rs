//! Entity types: customers, appointment types, series and appointments.
//!
//! Every entity carries a local sequential id. Customers and appointment
//! types additionally carry the id they have in the external billing system,
//! which is what catalog imports key on.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A billable customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub alt_name: Option<String>,
    pub notes: Option<String>,
    /// Contact id in the billing system
    pub contact_id: String,
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alt_name {
            Some(alt) => write!(f, "{} ({})", self.name, alt),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A kind of service that can be booked and billed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: u64,
    pub name: String,
    pub alt_name: Option<String>,
    /// Product id in the billing system
    pub product_id: String,
    /// Unit price
    pub price: f64,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.product_id)
    }
}

/// A run of temporally adjacent appointments for one customer, billed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSeries {
    pub id: u64,
    pub customer_id: u64,
    /// Set once an invoice has been exported for this series. Never reset.
    #[serde(default)]
    pub already_synchronized: bool,
}

/// A single booked appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: u64,
    pub series_id: u64,
    pub type_id: u64,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Event id in the calendar the appointment was imported from
    pub cal_id: Option<String>,
    /// Set when the appointment could not be matched to a customer or type
    pub system_note: Option<String>,
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
