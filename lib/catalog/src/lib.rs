//! The crop catalog.
//!
//! Crops are the knowledge-base entries that contributors author and
//! administrators curate. This crate holds the record type, the storage
//! trait, and an in-memory store.

pub mod crop;
pub mod error;
pub mod memory;
pub mod store;

pub use crop::{Crop, CropInput};
pub use error::CatalogError;
pub use memory::MemoryCropStore;
pub use store::CropStore;
