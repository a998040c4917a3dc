//! Postgres plumbing shared by the stores.
//!
//! User and session stores live in `auth::db`; the crop catalog store
//! lives here.

pub mod crop;

use agri_kb_catalog::CatalogError;
use agri_kb_platform_access::StoreError;

pub use crop::PgCropStore;

/// Wraps a malformed column value as a decode error.
pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

/// Names the unique field a violated constraint guards, if the error is a
/// unique violation.
fn unique_violation_field(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    let constraint = db_err.constraint().unwrap_or_default();
    let field = if constraint.contains("email") {
        "email"
    } else if constraint.contains("google_id") {
        "google_id"
    } else if constraint.contains("pkey") {
        "id"
    } else {
        constraint
    };
    Some(field.to_string())
}

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match unique_violation_field(&err) {
        Some(field) => StoreError::Conflict { field },
        None => StoreError::Backend {
            details: err.to_string(),
        },
    }
}

pub(crate) fn catalog_error(err: sqlx::Error) -> CatalogError {
    CatalogError::Backend {
        details: err.to_string(),
    }
}
