use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Outfit catalog entry stored in the `outfits` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Catalog-unique outfit name
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub sleeves: String,
    #[serde(default)]
    pub occasion: String,
    /// Body shape labels this outfit suits
    #[serde(default)]
    pub body_types: Vec<String>,
    /// Skin tone labels this outfit suits
    #[serde(default)]
    pub skin_tones: Vec<String>,
    /// Image path relative to the outfit images directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Legacy embedding written by the catalog seeder; stored but never read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<f64>>,
    /// Catalogs written by older seeders omit this field
    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,
}

impl Outfit {
    /// Creates a catalog entry with the current timestamp and no image
    pub fn new(name: String, category: String) -> Self {
        Self {
            id: None,
            name,
            category,
            color: String::new(),
            sleeves: String::new(),
            occasion: String::new(),
            body_types: Vec::new(),
            skin_tones: Vec::new(),
            image: None,
            features: None,
            created_at: DateTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outfit() {
        let outfit = Outfit::new("Kurta Blue".to_string(), "kurta".to_string());
        assert_eq!(outfit.name, "Kurta Blue");
        assert_eq!(outfit.category, "kurta");
        assert!(outfit.id.is_none());
        assert!(outfit.image.is_none());
    }

    #[test]
    fn test_id_skipped_when_absent() {
        let outfit = Outfit::new("Saree Red".to_string(), "saree".to_string());
        let json = serde_json::to_value(&outfit).unwrap();
        assert!(json.get("_id").is_none());
        assert_eq!(json["name"], "Saree Red");
    }

    #[test]
    fn test_deserializes_sparse_document() {
        // Seeded catalogs from older tooling omit most optional fields
        let doc = mongodb::bson::doc! {
            "name": "Standard outfit",
        };
        let outfit: Outfit = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(outfit.name, "Standard outfit");
        assert_eq!(outfit.category, "");
        assert!(outfit.body_types.is_empty());
    }
}
