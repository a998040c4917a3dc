//! In-memory crop store.

use agri_kb_core::{CropId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::crop::Crop;
use crate::error::CatalogError;
use crate::store::CropStore;

#[derive(Debug, Default)]
struct Catalog {
    crops: HashMap<CropId, Crop>,
    bookmarks: HashSet<(UserId, CropId)>,
}

impl Catalog {
    fn matching(&self, predicate: impl Fn(&Crop) -> bool) -> Vec<Crop> {
        let mut crops: Vec<Crop> = self
            .crops
            .values()
            .filter(|crop| predicate(crop))
            .cloned()
            .collect();
        crops.sort_by(|a, b| a.crop_name.cmp(&b.crop_name).then(a.id.cmp(&b.id)));
        crops
    }
}

/// Crop store backed by a `HashMap`; crops and bookmarks share one lock.
#[derive(Debug, Default)]
pub struct MemoryCropStore {
    catalog: RwLock<Catalog>,
}

impl MemoryCropStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CropStore for MemoryCropStore {
    async fn list(&self) -> Result<Vec<Crop>, CatalogError> {
        Ok(self.catalog.read().await.matching(|_| true))
    }

    async fn search(&self, query: &str) -> Result<Vec<Crop>, CatalogError> {
        Ok(self.catalog.read().await.matching(|c| c.name_matches(query)))
    }

    async fn list_accepted(&self) -> Result<Vec<Crop>, CatalogError> {
        Ok(self.catalog.read().await.matching(|c| c.accepted))
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Crop>, CatalogError> {
        Ok(self.catalog.read().await.matching(|c| c.author == author))
    }

    async fn find_by_id(&self, id: CropId) -> Result<Option<Crop>, CatalogError> {
        Ok(self.catalog.read().await.crops.get(&id).cloned())
    }

    async fn create(&self, crop: &Crop) -> Result<(), CatalogError> {
        self.catalog.write().await.crops.insert(crop.id, crop.clone());
        Ok(())
    }

    async fn update(&self, crop: &Crop) -> Result<Option<Crop>, CatalogError> {
        let mut catalog = self.catalog.write().await;
        Ok(catalog.crops.get_mut(&crop.id).map(|existing| {
            let accepted = existing.accepted;
            *existing = crop.clone();
            existing.accepted = accepted;
            existing.clone()
        }))
    }

    async fn set_accepted(
        &self,
        id: CropId,
        accepted: bool,
    ) -> Result<Option<Crop>, CatalogError> {
        let mut catalog = self.catalog.write().await;
        Ok(catalog.crops.get_mut(&id).map(|crop| {
            crop.accepted = accepted;
            crop.updated_at = chrono::Utc::now();
            crop.clone()
        }))
    }

    async fn delete(&self, id: CropId) -> Result<bool, CatalogError> {
        let mut catalog = self.catalog.write().await;
        catalog.bookmarks.retain(|(_, crop)| *crop != id);
        Ok(catalog.crops.remove(&id).is_some())
    }

    async fn toggle_bookmark(
        &self,
        user: UserId,
        crop: CropId,
    ) -> Result<Option<bool>, CatalogError> {
        let mut catalog = self.catalog.write().await;
        if !catalog.crops.contains_key(&crop) {
            return Ok(None);
        }
        if catalog.bookmarks.remove(&(user, crop)) {
            return Ok(Some(false));
        }
        catalog.bookmarks.insert((user, crop));
        Ok(Some(true))
    }

    async fn bookmarks(&self, user: UserId) -> Result<Vec<Crop>, CatalogError> {
        let catalog = self.catalog.read().await;
        Ok(catalog.matching(|c| catalog.bookmarks.contains(&(user, c.id))))
    }

    async fn clear_bookmarks(&self, user: UserId) -> Result<u64, CatalogError> {
        let mut catalog = self.catalog.write().await;
        let before = catalog.bookmarks.len();
        catalog.bookmarks.retain(|(holder, _)| *holder != user);
        Ok((before - catalog.bookmarks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropInput;

    fn crop(name: &str) -> Crop {
        crop_by(name, UserId::new())
    }

    fn crop_by(name: &str, author: UserId) -> Crop {
        Crop::new(
            CropInput {
                crop_name: name.to_string(),
                ..CropInput::default()
            },
            author,
        )
    }

    fn names(crops: Vec<Crop>) -> Vec<String> {
        crops.into_iter().map(|c| c.crop_name).collect()
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let store = MemoryCropStore::new();
        for name in ["Sorghum", "Barley", "Maize"] {
            store.create(&crop(name)).await.expect("create");
        }

        assert_eq!(
            names(store.list().await.expect("list")),
            vec!["Barley", "Maize", "Sorghum"]
        );
    }

    #[tokio::test]
    async fn search_filters_by_name() {
        let store = MemoryCropStore::new();
        for name in ["Pearl Millet", "Finger millet", "Cassava"] {
            store.create(&crop(name)).await.expect("create");
        }

        let found = store.search("MILLET").await.expect("search");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_report_presence() {
        let store = MemoryCropStore::new();
        let mut teff = crop("Teff");
        assert!(store.update(&teff).await.expect("update").is_none());

        store.create(&teff).await.expect("create");
        teff.crop_info = "Ethiopian grain".to_string();
        let stored = store.update(&teff).await.expect("update").expect("present");
        assert_eq!(stored.crop_info, "Ethiopian grain");

        assert!(store.delete(teff.id).await.expect("delete"));
        assert!(!store.delete(teff.id).await.expect("delete"));
    }

    #[tokio::test]
    async fn edits_keep_acceptance() {
        let store = MemoryCropStore::new();
        let mut okra = crop("Okra");
        store.create(&okra).await.expect("create");
        store.set_accepted(okra.id, true).await.expect("accept");

        okra.crop_type = "Vegetable".to_string();
        let stored = store.update(&okra).await.expect("update").expect("present");

        assert!(stored.accepted);
        assert_eq!(names(store.list_accepted().await.expect("accepted")), vec!["Okra"]);
    }

    #[tokio::test]
    async fn list_by_author_filters_on_author() {
        let store = MemoryCropStore::new();
        let author = UserId::new();
        store.create(&crop_by("Yam", author)).await.expect("create");
        store.create(&crop_by("Taro", author)).await.expect("create");
        store.create(&crop("Rice")).await.expect("create");

        assert_eq!(
            names(store.list_by_author(author).await.expect("by author")),
            vec!["Taro", "Yam"]
        );
    }

    #[tokio::test]
    async fn bookmarks_toggle_per_user() {
        let store = MemoryCropStore::new();
        let (ada, grace) = (UserId::new(), UserId::new());
        let rye = crop("Rye");
        store.create(&rye).await.expect("create");

        assert_eq!(store.toggle_bookmark(ada, rye.id).await.expect("toggle"), Some(true));
        assert_eq!(names(store.bookmarks(ada).await.expect("bookmarks")), vec!["Rye"]);
        assert!(store.bookmarks(grace).await.expect("bookmarks").is_empty());

        assert_eq!(store.toggle_bookmark(ada, rye.id).await.expect("toggle"), Some(false));
        assert!(store.bookmarks(ada).await.expect("bookmarks").is_empty());

        assert_eq!(
            store.toggle_bookmark(ada, CropId::new()).await.expect("toggle"),
            None
        );
    }

    #[tokio::test]
    async fn deleting_crop_or_clearing_user_drops_bookmarks() {
        let store = MemoryCropStore::new();
        let ada = UserId::new();
        let (oats, flax) = (crop("Oats"), crop("Flax"));
        for c in [&oats, &flax] {
            store.create(c).await.expect("create");
            store.toggle_bookmark(ada, c.id).await.expect("toggle");
        }

        store.delete(oats.id).await.expect("delete");
        assert_eq!(names(store.bookmarks(ada).await.expect("bookmarks")), vec!["Flax"]);

        assert_eq!(store.clear_bookmarks(ada).await.expect("clear"), 1);
        assert!(store.bookmarks(ada).await.expect("bookmarks").is_empty());
    }
}
