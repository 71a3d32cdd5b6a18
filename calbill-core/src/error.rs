//! Error types for calbill.

use thiserror::Error;

/// Errors that can occur in calbill operations.
#[derive(Error, Debug)]
pub enum CalBillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No support for billing system '{0}' (expected \"economic\" or \"billy\")")]
    UnsupportedSystem(String),

    #[error("No \"Default\" {0} found. Create it with `calbill defaults` before importing")]
    MissingDefault(&'static str),

    #[error("Customer not found: {0}")]
    CustomerNotFound(u64),

    #[error("Appointment type not found: {0}")]
    AppointmentTypeNotFound(u64),

    #[error("Appointment series not found: {0}")]
    SeriesNotFound(u64),

    #[error("Invalid event time: {0}")]
    InvalidEventTime(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calbill operations.
pub type CalBillResult<T> = Result<T, CalBillError>;
