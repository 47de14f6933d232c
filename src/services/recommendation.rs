use mongodb::bson::{doc, Document};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::db::FashionStore;
use crate::error::AppResult;
use crate::models::{BodyShape, Outfit, SkinTone};

/// Similarity scores are uniform in [floor, floor + span), rounded to two
/// decimals. The randomness is the product's documented ranking behavior,
/// not a placeholder.
pub const SIMILARITY_FLOOR: f64 = 0.65;
pub const SIMILARITY_SPAN: f64 = 0.30;

/// How many candidates to pull per requested result
const CANDIDATE_FACTOR: i64 = 3;

/// Optional equality filters applied when fetching candidates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutfitFilters {
    pub category: Option<String>,
    pub color: Option<String>,
    pub occasion: Option<String>,
    pub sleeves: Option<String>,
}

impl OutfitFilters {
    pub fn to_query(&self) -> Document {
        let mut query = Document::new();
        if let Some(category) = &self.category {
            query.insert("category", category);
        }
        if let Some(color) = &self.color {
            query.insert("color", color);
        }
        if let Some(occasion) = &self.occasion {
            query.insert("occasion", occasion);
        }
        if let Some(sleeves) = &self.sleeves {
            query.insert("sleeves", sleeves);
        }
        query
    }
}

/// One ranked recommendation
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationItem {
    pub rank: usize,
    pub outfit_name: String,
    pub image: Option<String>,
    pub category: String,
    pub color: String,
    pub sleeves: String,
    pub similarity_score: f64,
    pub similarity_percentage: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub success: bool,
    pub body_type_detected: String,
    pub skin_tone_detected: String,
    pub total_matches: usize,
    pub recommendations: Vec<RecommendationItem>,
}

/// Draws one similarity score: uniform in [0.65, 0.95), two decimals
pub fn similarity_score(rng: &mut impl Rng) -> f64 {
    let raw = SIMILARITY_FLOOR + rng.gen::<f64>() * SIMILARITY_SPAN;
    (raw * 100.0).round() / 100.0
}

/// Scores, orders, and truncates a candidate list. Ranks are reassigned
/// 1.. after the sort.
pub fn rank_outfits(
    outfits: Vec<Outfit>,
    top_k: usize,
    rng: &mut impl Rng,
) -> Vec<RecommendationItem> {
    let mut items: Vec<RecommendationItem> = outfits
        .into_iter()
        .map(|outfit| {
            let score = similarity_score(rng);
            RecommendationItem {
                rank: 0,
                outfit_name: outfit.name,
                image: outfit.image,
                category: outfit.category,
                color: outfit.color,
                sleeves: outfit.sleeves,
                similarity_score: score,
                similarity_percentage: format!("{}%", (score * 100.0).round() as i64),
            }
        })
        .collect();

    items.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(top_k);

    for (index, item) in items.iter_mut().enumerate() {
        item.rank = index + 1;
    }

    items
}

/// Generates recommendations for already-analyzed user features.
///
/// Fetches up to `top_k * 3` candidates matching the filters, assigns each a
/// random similarity score, and returns the best `top_k`. An empty catalog
/// still succeeds with an empty list.
pub async fn generate(
    store: &dyn FashionStore,
    body_type: BodyShape,
    skin_tone: SkinTone,
    top_k: i64,
    filters: &OutfitFilters,
) -> AppResult<RecommendationsResponse> {
    let top_k = top_k.max(0);
    let candidates = store
        .find_outfits(filters.to_query(), top_k * CANDIDATE_FACTOR)
        .await?;

    let mut rng = rand::thread_rng();
    let recommendations = rank_outfits(candidates, top_k as usize, &mut rng);

    Ok(RecommendationsResponse {
        success: true,
        body_type_detected: body_type.to_string(),
        skin_tone_detected: skin_tone.to_string(),
        total_matches: recommendations.len(),
        recommendations,
    })
}

/// Static outfit suggestion per body shape and occasion
pub fn suggest(body_type: &str, occasion: &str) -> &'static str {
    match (body_type, occasion) {
        ("Inverted Triangle", "Casual") => "Flared jeans with soft tops",
        ("Inverted Triangle", "Wedding") => "A-line gown",
        ("Inverted Triangle", "Office") => "Peplum tops with straight pants",
        ("Pear", "Casual") => "High-waist jeans with structured tops",
        ("Pear", "Wedding") => "Empire waist dress",
        ("Pear", "Office") => "Structured blazers",
        ("Rectangle", "Casual") => "Anything suits you!",
        ("Rectangle", "Wedding") => "Bodycon dress",
        ("Rectangle", "Office") => "Tailored suits",
        ("Hourglass", "Casual") => "Wrap tops with high-waist jeans",
        ("Hourglass", "Wedding") => "Mermaid gown",
        ("Hourglass", "Office") => "Belted sheath dress",
        ("Apple", "Casual") => "Flowy tunics with slim pants",
        ("Apple", "Wedding") => "Empire waist gown",
        ("Apple", "Office") => "Open-front cardigans with straight trousers",
        _ => "Standard outfit",
    }
}
