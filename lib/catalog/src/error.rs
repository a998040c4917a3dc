//! Catalog errors.

use std::fmt;

/// Errors from the crop store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The submitted crop is missing a required field.
    Invalid { field: &'static str },
    /// The backing store failed.
    Backend { details: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { field } => write!(f, "crop {field} is required"),
            Self::Backend { details } => write!(f, "catalog store error: {details}"),
        }
    }
}

impl std::error::Error for CatalogError {}
