use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Identity record in the `users` collection.
///
/// Profiles are schemaless beyond these fields: whatever the client posts is
/// merged in with `$set`, so reads go through raw documents rather than this
/// struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub created_at: DateTime,
}

impl User {
    /// Creates a fresh record for a user seen for the first time
    pub fn new(user_id: String) -> Self {
        Self {
            id: None,
            user_id,
            created_at: DateTime::now(),
        }
    }
}
