use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Metadata for an uploaded user photo, stored in the `user_images` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserImage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Server-assigned UUID identifying the upload
    pub image_id: String,
    pub user_id: String,
    /// Path of the saved file under the upload directory
    pub file_path: String,
    /// Original client filename
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: DateTime,
}
