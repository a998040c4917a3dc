//! Crop records.

use agri_kb_core::{CropId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A crop entry in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: CropId,
    pub crop_name: String,
    pub scientific_name: String,
    pub crop_family: String,
    pub crop_type: String,
    pub crop_intro: String,
    pub crop_image: String,
    pub crop_info: String,
    pub other_info: String,
    /// The account that last authored this entry.
    pub author: UserId,
    /// Set once a moderator has approved the entry.
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a contributor submits when creating or editing a crop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropInput {
    pub crop_name: String,
    pub scientific_name: String,
    pub crop_family: String,
    pub crop_type: String,
    pub crop_intro: String,
    pub crop_image: String,
    pub crop_info: String,
    pub other_info: String,
}

impl CropInput {
    /// Checks that the crop has a name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` naming the first empty required field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.crop_name.trim().is_empty() {
            return Err(CatalogError::Invalid { field: "cropName" });
        }
        Ok(())
    }
}

impl Crop {
    /// Creates a new entry authored by `author`.
    #[must_use]
    pub fn new(input: CropInput, author: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CropId::new(),
            crop_name: input.crop_name,
            scientific_name: input.scientific_name,
            crop_family: input.crop_family,
            crop_type: input.crop_type,
            crop_intro: input.crop_intro,
            crop_image: input.crop_image,
            crop_info: input.crop_info,
            other_info: input.other_info,
            author,
            accepted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields and records `author` as the editor.
    /// Acceptance is unchanged.
    pub fn apply(&mut self, input: CropInput, author: UserId) {
        self.crop_name = input.crop_name;
        self.scientific_name = input.scientific_name;
        self.crop_family = input.crop_family;
        self.crop_type = input.crop_type;
        self.crop_intro = input.crop_intro;
        self.crop_image = input.crop_image;
        self.crop_info = input.crop_info;
        self.other_info = input.other_info;
        self.author = author;
        self.updated_at = Utc::now();
    }

    /// Case-insensitive substring match on the crop name.
    #[must_use]
    pub fn name_matches(&self, query: &str) -> bool {
        self.crop_name
            .to_lowercase()
            .contains(&query.trim().to_lowercase())
    }
}
