use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::WishlistItem;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_item))
        .route("/remove", post(remove_item))
        .route("/clear", post(clear_wishlist))
        .route("/get", get(get_wishlist))
        .route("/count", get(count_wishlist))
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub user_id: String,
    pub outfit_name: String,
    #[serde(default)]
    pub similarity_score: f64,
    #[serde(default)]
    pub image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub user_id: String,
    pub outfit_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct WishlistEntry {
    pub user_id: String,
    pub outfit_name: String,
    pub similarity_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub saved_date: DateTime<Utc>,
}

impl From<WishlistItem> for WishlistEntry {
    fn from(item: WishlistItem) -> Self {
        Self {
            user_id: item.user_id,
            outfit_name: item.outfit_name,
            similarity_score: item.similarity_score,
            image_id: item.image_id,
            saved_date: item.saved_date.to_chrono(),
        }
    }
}

// Handlers

/// Saves an outfit for a user. A second add of the same outfit is a no-op
/// reported as already saved.
pub async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddRequest>,
) -> AppResult<Json<Value>> {
    let existing = state
        .store
        .wishlist_find(&request.user_id, &request.outfit_name)
        .await?;

    if existing.is_some() {
        return Ok(Json(json!({
            "success": true,
            "message": "Already in wishlist"
        })));
    }

    let item = WishlistItem {
        id: None,
        user_id: request.user_id,
        outfit_name: request.outfit_name,
        similarity_score: request.similarity_score,
        image_id: request.image_id,
        saved_date: mongodb::bson::DateTime::now(),
    };

    let item_id = state.store.wishlist_insert(&item).await?;
    tracing::info!(
        user_id = %item.user_id,
        outfit_name = %item.outfit_name,
        "Added to wishlist"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Added to wishlist",
        "item_id": item_id
    })))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Json(request): Json<RemoveRequest>,
) -> AppResult<Json<Value>> {
    let deleted = state
        .store
        .wishlist_remove(&request.user_id, &request.outfit_name)
        .await?;

    if deleted == 0 {
        return Err(AppError::NotFound("Item not found in wishlist".to_string()));
    }

    tracing::info!(
        user_id = %request.user_id,
        outfit_name = %request.outfit_name,
        "Removed from wishlist"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Removed from wishlist"
    })))
}

pub async fn clear_wishlist(
    State(state): State<AppState>,
    Json(request): Json<ClearRequest>,
) -> AppResult<Json<Value>> {
    let deleted = state.store.wishlist_clear(&request.user_id).await?;
    tracing::info!(user_id = %request.user_id, deleted = deleted, "Wishlist cleared");

    Ok(Json(json!({
        "success": true,
        "message": format!("Cleared {} items from wishlist", deleted),
        "deleted_count": deleted
    })))
}

/// Lists a user's saved outfits, newest first
pub async fn get_wishlist(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> AppResult<Json<Value>> {
    let items: Vec<WishlistEntry> = state
        .store
        .wishlist_items(&params.user_id)
        .await?
        .into_iter()
        .map(WishlistEntry::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "user_id": params.user_id,
        "total": items.len(),
        "items": items,
    })))
}

pub async fn count_wishlist(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> AppResult<Json<Value>> {
    let count = state.store.wishlist_count(&params.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "user_id": params.user_id,
        "count": count
    })))
}
