use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::{BodyShape, SkinTone};

/// Derived analysis results for one uploaded photo, stored in the
/// `user_features` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeatures {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub image_id: String,
    pub user_id: String,
    pub body_type: BodyShape,
    pub body_type_confidence: f64,
    pub skin_tone: SkinTone,
    pub skin_tone_confidence: f64,
    /// Shoulder width over hip width, 0.0 when no pose was detected
    pub shoulder_hip_ratio: f64,
    /// Estimated waist width over hip width, 0.0 when no pose was detected
    pub waist_hip_ratio: f64,
    pub created_at: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_stored_as_display_strings() {
        let features = UserFeatures {
            id: None,
            image_id: "img-1".to_string(),
            user_id: "default_user".to_string(),
            body_type: BodyShape::InvertedTriangle,
            body_type_confidence: 0.85,
            skin_tone: SkinTone::Tan,
            skin_tone_confidence: 0.85,
            shoulder_hip_ratio: 1.3,
            waist_hip_ratio: 0.8,
            created_at: DateTime::now(),
        };

        let doc = mongodb::bson::to_document(&features).unwrap();
        assert_eq!(
            doc.get_str("body_type").unwrap(),
            "Inverted Triangle"
        );
        assert_eq!(doc.get_str("skin_tone").unwrap(), "Tan");
    }
}
