//! Postgres store for the crop catalog.

use agri_kb_catalog::{CatalogError, Crop, CropStore};
use agri_kb_core::{CropId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::{catalog_error, decode_error};

const CROP_COLUMNS: &str = "id, crop_name, scientific_name, crop_family, crop_type, \
     crop_intro, crop_image, crop_info, other_info, author, accepted, created_at, updated_at";

/// Row type for crop queries.
#[derive(FromRow)]
struct CropRow {
    id: String,
    crop_name: String,
    scientific_name: String,
    crop_family: String,
    crop_type: String,
    crop_intro: String,
    crop_image: String,
    crop_info: String,
    other_info: String,
    author: String,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CropRow {
    fn try_into_crop(self) -> Result<Crop, sqlx::Error> {
        let id = CropId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid crop id '{}': {e}", self.id)))?;
        let author = UserId::from_str(&self.author)
            .map_err(|e| decode_error(format!("invalid author id '{}': {e}", self.author)))?;
        Ok(Crop {
            id,
            crop_name: self.crop_name,
            scientific_name: self.scientific_name,
            crop_family: self.crop_family,
            crop_type: self.crop_type,
            crop_intro: self.crop_intro,
            crop_image: self.crop_image,
            crop_info: self.crop_info,
            other_info: self.other_info,
            author,
            accepted: self.accepted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_crop(row: Option<CropRow>) -> Result<Option<Crop>, CatalogError> {
    row.map(CropRow::try_into_crop)
        .transpose()
        .map_err(catalog_error)
}

fn into_crops(rows: Vec<CropRow>) -> Result<Vec<Crop>, CatalogError> {
    rows.into_iter()
        .map(CropRow::try_into_crop)
        .collect::<Result<_, _>>()
        .map_err(catalog_error)
}

/// Crop store backed by Postgres. Bookmarks live in `crop_bookmarks`, whose
/// foreign keys cascade on crop and user deletion.
pub struct PgCropStore {
    pool: PgPool,
}

impl PgCropStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CropStore for PgCropStore {
    async fn list(&self) -> Result<Vec<Crop>, CatalogError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops ORDER BY crop_name, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crops(rows)
    }

    async fn search(&self, query: &str) -> Result<Vec<Crop>, CatalogError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops \
             WHERE strpos(lower(crop_name), lower(trim($1))) > 0 \
             ORDER BY crop_name, id"
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crops(rows)
    }

    async fn list_accepted(&self) -> Result<Vec<Crop>, CatalogError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE accepted ORDER BY crop_name, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crops(rows)
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Crop>, CatalogError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE author = $1 ORDER BY crop_name, id"
        ))
        .bind(author.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crops(rows)
    }

    async fn find_by_id(&self, id: CropId) -> Result<Option<Crop>, CatalogError> {
        let row: Option<CropRow> =
            sqlx::query_as(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = $1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(catalog_error)?;

        into_crop(row)
    }

    async fn create(&self, crop: &Crop) -> Result<(), CatalogError> {
        sqlx::query(&format!(
            "INSERT INTO crops ({CROP_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(crop.id.to_string())
        .bind(&crop.crop_name)
        .bind(&crop.scientific_name)
        .bind(&crop.crop_family)
        .bind(&crop.crop_type)
        .bind(&crop.crop_intro)
        .bind(&crop.crop_image)
        .bind(&crop.crop_info)
        .bind(&crop.other_info)
        .bind(crop.author.to_string())
        .bind(crop.accepted)
        .bind(crop.created_at)
        .bind(crop.updated_at)
        .execute(&self.pool)
        .await
        .map_err(catalog_error)?;

        Ok(())
    }

    async fn update(&self, crop: &Crop) -> Result<Option<Crop>, CatalogError> {
        let row: Option<CropRow> = sqlx::query_as(&format!(
            "UPDATE crops \
             SET crop_name = $2, scientific_name = $3, crop_family = $4, crop_type = $5, \
                 crop_intro = $6, crop_image = $7, crop_info = $8, other_info = $9, \
                 author = $10, updated_at = $11 \
             WHERE id = $1 \
             RETURNING {CROP_COLUMNS}"
        ))
        .bind(crop.id.to_string())
        .bind(&crop.crop_name)
        .bind(&crop.scientific_name)
        .bind(&crop.crop_family)
        .bind(&crop.crop_type)
        .bind(&crop.crop_intro)
        .bind(&crop.crop_image)
        .bind(&crop.crop_info)
        .bind(&crop.other_info)
        .bind(crop.author.to_string())
        .bind(crop.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crop(row)
    }

    async fn set_accepted(
        &self,
        id: CropId,
        accepted: bool,
    ) -> Result<Option<Crop>, CatalogError> {
        let row: Option<CropRow> = sqlx::query_as(&format!(
            "UPDATE crops SET accepted = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {CROP_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(accepted)
        .fetch_optional(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crop(row)
    }

    async fn delete(&self, id: CropId) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM crops WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(catalog_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_bookmark(
        &self,
        user: UserId,
        crop: CropId,
    ) -> Result<Option<bool>, CatalogError> {
        let removed =
            sqlx::query("DELETE FROM crop_bookmarks WHERE user_id = $1 AND crop_id = $2")
                .bind(user.to_string())
                .bind(crop.to_string())
                .execute(&self.pool)
                .await
                .map_err(catalog_error)?;
        if removed.rows_affected() > 0 {
            return Ok(Some(false));
        }

        // Selecting from crops leaves nothing to insert for a missing crop.
        let added = sqlx::query(
            r#"
            INSERT INTO crop_bookmarks (user_id, crop_id)
            SELECT $1, id FROM crops WHERE id = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.to_string())
        .bind(crop.to_string())
        .execute(&self.pool)
        .await
        .map_err(catalog_error)?;
        if added.rows_affected() > 0 {
            return Ok(Some(true));
        }

        // A concurrent toggle may have inserted the same bookmark.
        Ok(self.find_by_id(crop).await?.map(|_| true))
    }

    async fn bookmarks(&self, user: UserId) -> Result<Vec<Crop>, CatalogError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops \
             WHERE id IN (SELECT crop_id FROM crop_bookmarks WHERE user_id = $1) \
             ORDER BY crop_name, id"
        ))
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_error)?;

        into_crops(rows)
    }

    async fn clear_bookmarks(&self, user: UserId) -> Result<u64, CatalogError> {
        let result = sqlx::query("DELETE FROM crop_bookmarks WHERE user_id = $1")
            .bind(user.to_string())
            .execute(&self.pool)
            .await
            .map_err(catalog_error)?;

        Ok(result.rows_affected())
    }
}
