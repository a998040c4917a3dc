//! Crop storage trait.

use agri_kb_core::{CropId, UserId};
use async_trait::async_trait;

use crate::crop::Crop;
use crate::error::CatalogError;

/// Persistence for crop entries and the bookmarks users keep on them.
///
/// Every listing is sorted by name. Deleting a crop removes its bookmarks.
#[async_trait]
pub trait CropStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Crop>, CatalogError>;

    /// Crops whose name contains `query`, ignoring case.
    async fn search(&self, query: &str) -> Result<Vec<Crop>, CatalogError>;

    /// Crops a moderator has approved.
    async fn list_accepted(&self) -> Result<Vec<Crop>, CatalogError>;

    /// Crops last authored by `author`.
    async fn list_by_author(&self, author: UserId) -> Result<Vec<Crop>, CatalogError>;

    async fn find_by_id(&self, id: CropId) -> Result<Option<Crop>, CatalogError>;

    async fn create(&self, crop: &Crop) -> Result<(), CatalogError>;

    /// Writes the editable fields, author, and update time of `crop`. The
    /// stored acceptance flag is kept.
    ///
    /// Returns the stored crop, or `None` if no crop with that id exists.
    async fn update(&self, crop: &Crop) -> Result<Option<Crop>, CatalogError>;

    async fn set_accepted(&self, id: CropId, accepted: bool)
    -> Result<Option<Crop>, CatalogError>;

    /// Returns false if no crop with that id existed.
    async fn delete(&self, id: CropId) -> Result<bool, CatalogError>;

    /// Adds `crop` to the bookmarks of `user`, or removes it if present.
    ///
    /// Returns whether the crop is bookmarked afterwards, or `None` if the
    /// crop does not exist.
    async fn toggle_bookmark(
        &self,
        user: UserId,
        crop: CropId,
    ) -> Result<Option<bool>, CatalogError>;

    /// Crops bookmarked by `user`.
    async fn bookmarks(&self, user: UserId) -> Result<Vec<Crop>, CatalogError>;

    /// Drops every bookmark held by `user`, returning how many there were.
    async fn clear_bookmarks(&self, user: UserId) -> Result<u64, CatalogError>;
}
