mod csv_import;
mod json_import;

use std::fmt;

use crate::models::Subscription;

pub(crate) use csv_import::CsvImporter;
pub(crate) use json_import::parse_api_response;

/// Column layout shared by CSV import and export.
pub(crate) const CSV_COLUMNS: [&str; 10] = [
    "id",
    "name",
    "price",
    "currency",
    "frequency",
    "category",
    "payment_method",
    "status",
    "start_date",
    "renewal_date",
];

#[derive(Debug)]
pub(crate) enum ImportError {
    /// The payload does not have the expected overall shape.
    InvalidInput(String),
    Json(serde_json::Error),
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ImportError::Json(err) => write!(f, "JSON error: {}", err),
            ImportError::Csv(err) => write!(f, "CSV error: {}", err),
            ImportError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::InvalidInput(_) => None,
            ImportError::Json(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Io(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Json(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err)
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

/// A record that could not be turned into a subscription, and why.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SkippedRecord {
    /// Zero-based position in the source.
    pub(crate) index: usize,
    pub(crate) reason: String,
}

/// Subscriptions read from an import source plus the records that were rejected.
#[derive(Debug, Default)]
pub(crate) struct Imported {
    pub(crate) records: Vec<Subscription>,
    pub(crate) skipped: Vec<SkippedRecord>,
}
