use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Saved outfit entry in the `wishlist` collection.
///
/// Uniqueness per (user_id, outfit_name) is enforced by a pre-check query at
/// insert time, not by an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub outfit_name: String,
    #[serde(default)]
    pub similarity_score: f64,
    /// Upload the recommendation was generated from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub saved_date: DateTime,
}
