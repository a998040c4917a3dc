//! Core domain types and utilities for the agri-kb knowledge base.
//!
//! This crate provides the identifier types and the error-handling
//! foundation shared by the access-control, catalog, and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CropId, ParseIdError, UserId};
