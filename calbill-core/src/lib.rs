//! Core of calbill: turning calendar events into billed appointment series.
//!
//! - `matcher` resolves free text to customers and appointment types
//! - `series` groups appointments into series of adjacent days
//! - `import` converts calendar events into appointments
//! - `invoice` builds and exports invoices per series
//! - `catalog` synchronizes customers and products from a billing system

pub mod billing;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod import;
pub mod invoice;
pub mod matcher;
pub mod model;
pub mod series;
pub mod store;

pub use billing::{
    BillingBackend, CalendarSource, InvoiceDraft, InvoiceLine, RemoteContact, RemoteProduct,
};
pub use error::{CalBillError, CalBillResult};
pub use event::{CalendarEvent, EventTime};
pub use model::{Appointment, AppointmentSeries, AppointmentType, Customer};
pub use store::Store;
