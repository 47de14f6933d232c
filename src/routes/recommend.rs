use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::Outfit;
use crate::services::recommendation::{self, OutfitFilters, RecommendationsResponse};

use super::AppState;

/// Catalog listings are capped so a large seed run cannot flood the response
const OUTFIT_LIST_LIMIT: i64 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(quick_suggestion))
        .route("/generate", post(generate_recommendations))
        .route("/outfits", get(list_outfits))
        .route("/outfits/:name", get(get_outfit))
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub body_type: String,
    pub occasion: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub image_id: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(flatten)]
    pub filters: OutfitFilters,
}

fn default_top_k() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct OutfitSummary {
    pub name: String,
    pub category: String,
    pub color: String,
    pub sleeves: String,
    pub occasion: String,
    pub body_types: Vec<String>,
    pub skin_tones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<Outfit> for OutfitSummary {
    fn from(outfit: Outfit) -> Self {
        Self {
            name: outfit.name,
            category: outfit.category,
            color: outfit.color,
            sleeves: outfit.sleeves,
            occasion: outfit.occasion,
            body_types: outfit.body_types,
            skin_tones: outfit.skin_tones,
            image: outfit.image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutfitListResponse {
    pub success: bool,
    pub outfits: Vec<OutfitSummary>,
    pub total: usize,
}

// Handlers

/// Rule-based lookup mapping a body shape and occasion to one suggestion
pub async fn quick_suggestion(Query(params): Query<SuggestionQuery>) -> Json<Value> {
    let outfit = recommendation::suggest(&params.body_type, &params.occasion);
    Json(json!({ "recommended_outfit": outfit }))
}

/// Scores catalog outfits against an analyzed upload and returns the top
/// matches
pub async fn generate_recommendations(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<RecommendationsResponse>> {
    let features = state
        .store
        .find_features(&request.image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Features not found for this image".to_string()))?;

    tracing::info!(
        image_id = %request.image_id,
        body_type = %features.body_type,
        skin_tone = %features.skin_tone,
        top_k = request.top_k,
        "Generating recommendations"
    );

    let response = recommendation::generate(
        state.store.as_ref(),
        features.body_type,
        features.skin_tone,
        request.top_k,
        &request.filters,
    )
    .await?;

    Ok(Json(response))
}

/// Lists the outfit catalog, used by the frontend to pair recommendations
/// with their images
pub async fn list_outfits(State(state): State<AppState>) -> AppResult<Json<OutfitListResponse>> {
    let outfits: Vec<OutfitSummary> = state
        .store
        .find_outfits(Document::new(), OUTFIT_LIST_LIMIT)
        .await?
        .into_iter()
        .map(OutfitSummary::from)
        .collect();
    let total = outfits.len();

    Ok(Json(OutfitListResponse {
        success: true,
        outfits,
        total,
    }))
}

pub async fn get_outfit(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    let outfit = state
        .store
        .find_outfits(mongodb::bson::doc! {"name": &name}, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Outfit not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "outfit": OutfitSummary::from(outfit),
    })))
}
