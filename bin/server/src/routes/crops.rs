//! Crop catalog routes under `/api/crops`.

use agri_kb_catalog::{Crop, CropInput};
use agri_kb_core::{CropId, UserId};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::users::MessageBody;
use crate::auth::{AppState, RequireAdmin, RequireAdminContributor, RequireAdminMod, RequireAuth};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_crops).post(create_crop))
        .route("/search", get(search_crops))
        .route("/accepted", get(list_accepted))
        .route("/author/{id}", get(list_by_author))
        .route("/bookmark/{id}", put(toggle_bookmark))
        .route("/bookmarks/{id}", get(list_bookmarks))
        .route("/{id}", get(get_crop).put(update_crop).delete(delete_crop))
        .route("/{id}/accept", put(accept_crop))
}

fn parse_crop_id(raw: &str) -> Result<CropId, ApiError> {
    CropId::from_str(raw).map_err(|_| ApiError::NotFound("Crop not found"))
}

fn found(crop: Option<Crop>) -> Result<Crop, ApiError> {
    crop.ok_or(ApiError::NotFound("Crop not found"))
}

async fn load_crop(state: &AppState, raw_id: &str) -> Result<Crop, ApiError> {
    let id = parse_crop_id(raw_id)?;
    found(state.crops.find_by_id(id).await?)
}

async fn list_crops(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Crop>>, ApiError> {
    Ok(Json(state.crops.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_crops(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Crop>>, ApiError> {
    Ok(Json(state.crops.search(&query.q).await?))
}

async fn list_accepted(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Crop>>, ApiError> {
    Ok(Json(state.crops.list_accepted().await?))
}

/// Crops last authored by a user. Public, like the author byline.
async fn list_by_author(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<Crop>>, ApiError> {
    let author = UserId::from_str(&id).map_err(|_| ApiError::NotFound("User not found"))?;
    Ok(Json(state.crops.list_by_author(author).await?))
}

async fn get_crop(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Crop>, ApiError> {
    Ok(Json(load_crop(&state, &id).await?))
}

async fn create_crop(
    State(state): State<Arc<AppState>>,
    RequireAdminContributor(author): RequireAdminContributor,
    ApiJson(input): ApiJson<CropInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let crop = Crop::new(input, author.user_id());
    state.crops.create(&crop).await?;
    tracing::info!(crop_id = %crop.id, user_id = %author.user_id(), "crop created");
    Ok((StatusCode::CREATED, Json(crop)))
}

async fn update_crop(
    State(state): State<Arc<AppState>>,
    RequireAdminContributor(author): RequireAdminContributor,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<CropInput>,
) -> Result<Json<Crop>, ApiError> {
    input.validate()?;
    let mut crop = load_crop(&state, &id).await?;
    crop.apply(input, author.user_id());
    Ok(Json(found(state.crops.update(&crop).await?)?))
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    #[serde(default = "default_accepted")]
    accepted: bool,
}

fn default_accepted() -> bool {
    true
}

/// Approves a crop for the public catalog, or withdraws approval.
async fn accept_crop(
    State(state): State<Arc<AppState>>,
    RequireAdminMod(moderator): RequireAdminMod,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<AcceptRequest>,
) -> Result<Json<Crop>, ApiError> {
    let id = parse_crop_id(&id)?;
    let crop = found(state.crops.set_accepted(id, body.accepted).await?)?;
    tracing::info!(
        crop_id = %crop.id,
        user_id = %moderator.user_id(),
        accepted = crop.accepted,
        "crop moderated"
    );
    Ok(Json(crop))
}

async fn delete_crop(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let crop = load_crop(&state, &id).await?;
    if !state.crops.delete(crop.id).await? {
        return Err(ApiError::NotFound("Crop not found"));
    }
    tracing::info!(crop_id = %crop.id, user_id = %admin.user_id(), "crop removed");
    Ok(Json(MessageBody {
        message: "Crop removed",
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStatus {
    crop_id: CropId,
    bookmarked: bool,
}

/// Bookmarks a crop for the caller, or removes the bookmark.
async fn toggle_bookmark(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<BookmarkStatus>, ApiError> {
    let crop_id = parse_crop_id(&id)?;
    let bookmarked = state
        .crops
        .toggle_bookmark(caller.user_id(), crop_id)
        .await?
        .ok_or(ApiError::NotFound("Crop not found"))?;
    Ok(Json(BookmarkStatus {
        crop_id,
        bookmarked,
    }))
}

/// The caller's own bookmarked crops.
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<Crop>>, ApiError> {
    let owner = UserId::from_str(&id).map_err(|_| ApiError::NotFound("User not found"))?;
    caller.ensure_owner(owner)?;
    Ok(Json(state.crops.bookmarks(owner).await?))
}
