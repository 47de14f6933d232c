//! Seeds the outfit catalog from a directory tree of images.
//!
//! Expects the outfit images directory to hold one subdirectory per category
//! (dress/, pants/, ...) with image files inside. The whole catalog is
//! replaced on every run.

use std::path::Path;

use mongodb::bson::doc;
use mongodb::Collection;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use lookbook_api::config::Config;
use lookbook_api::db::{self, OUTFITS_COLLECTION};
use lookbook_api::models::Outfit;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Embedding width kept for compatibility with older catalog tooling
const FEATURE_DIMENSIONS: usize = 512;

const SKIN_TONES: &[&str] = &["fair", "medium", "tan", "deep"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let database = db::connect(&config).await?;
    let outfits: Collection<Outfit> = database.collection(OUTFITS_COLLECTION);

    let root = Path::new(&config.outfit_images_dir);
    if !root.is_dir() {
        anyhow::bail!("outfit images directory not found: {}", root.display());
    }

    let deleted = outfits.delete_many(doc! {}).await?.deleted_count;
    tracing::info!(deleted = deleted, "Cleared existing catalog");

    let mut total = 0u64;
    let mut skipped = 0u64;

    let mut categories: Vec<_> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .collect();
    categories.sort_by_key(|entry| entry.file_name());

    for category_dir in categories {
        let category = category_dir.file_name().to_string_lossy().into_owned();

        let mut files: Vec<_> = std::fs::read_dir(category_dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file() && has_image_extension(&entry.path()))
            .collect();
        files.sort_by_key(|entry| entry.file_name());

        tracing::info!(category = %category, files = files.len(), "Processing category");

        let mut inserted = 0u64;
        for file in files {
            let path = file.path();
            if image::open(&path).is_err() {
                tracing::warn!(path = %path.display(), "Skipping unreadable image");
                skipped += 1;
                continue;
            }

            let file_name = file.file_name().to_string_lossy().into_owned();
            let outfit = build_outfit(&category, &file_name);
            outfits.insert_one(&outfit).await?;
            inserted += 1;
            total += 1;

            if inserted % 50 == 0 {
                tracing::info!(category = %category, inserted = inserted, "Progress");
            }
        }

        tracing::info!(category = %category, inserted = inserted, "Category complete");
    }

    let count = outfits.count_documents(doc! {}).await?;
    tracing::info!(
        inserted = total,
        skipped = skipped,
        in_database = count,
        "Seeding complete"
    );

    Ok(())
}

fn build_outfit(category: &str, file_name: &str) -> Outfit {
    let mut rng = rand::thread_rng();
    let mut outfit = Outfit::new(file_name.to_string(), category.to_string());
    outfit.color = "multi".to_string();
    outfit.sleeves = "unknown".to_string();
    outfit.occasion = occasion_for(category).to_string();
    outfit.body_types = body_types_for(category)
        .iter()
        .map(|label| label.to_string())
        .collect();
    outfit.skin_tones = SKIN_TONES.iter().map(|label| label.to_string()).collect();
    outfit.image = Some(format!("{}/{}", category, file_name));
    outfit.features = Some((0..FEATURE_DIMENSIONS).map(|_| rng.gen::<f64>()).collect());
    outfit
}

/// Body shape labels an outfit category flatters
fn body_types_for(category: &str) -> &'static [&'static str] {
    let category = category.to_lowercase();
    if category.contains("dress") {
        &["hourglass", "pear", "rectangle", "apple"]
    } else if category.contains("pants") {
        &["rectangle", "apple", "pear"]
    } else if category.contains("longsleeve") || category.contains("shirt") {
        &["hourglass", "pear", "apple", "rectangle"]
    } else if category.contains("shorts") || category.contains("skirt") {
        &["hourglass", "pear", "apple"]
    } else {
        &["hourglass", "pear", "rectangle", "apple"]
    }
}

fn occasion_for(category: &str) -> &'static str {
    if category.to_lowercase().contains("dress") {
        "party"
    } else {
        "casual"
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occasion_per_category() {
        assert_eq!(occasion_for("dress"), "party");
        assert_eq!(occasion_for("Dress"), "party");
        assert_eq!(occasion_for("pants"), "casual");
        assert_eq!(occasion_for("hat"), "casual");
    }

    #[test]
    fn test_body_types_per_category() {
        assert_eq!(body_types_for("pants"), &["rectangle", "apple", "pear"]);
        assert_eq!(body_types_for("skirt"), &["hourglass", "pear", "apple"]);
        assert_eq!(
            body_types_for("t-shirt"),
            &["hourglass", "pear", "apple", "rectangle"]
        );
        assert_eq!(
            body_types_for("unheard-of"),
            &["hourglass", "pear", "rectangle", "apple"]
        );
    }

    #[test]
    fn test_image_extension_filter() {
        assert!(has_image_extension(Path::new("dress/a.jpg")));
        assert!(has_image_extension(Path::new("dress/a.WEBP")));
        assert!(!has_image_extension(Path::new("dress/notes.txt")));
        assert!(!has_image_extension(Path::new("dress/no_extension")));
    }

    #[test]
    fn test_build_outfit_fields() {
        let outfit = build_outfit("dress", "red_gown.jpg");
        assert_eq!(outfit.name, "red_gown.jpg");
        assert_eq!(outfit.category, "dress");
        assert_eq!(outfit.color, "multi");
        assert_eq!(outfit.occasion, "party");
        assert_eq!(outfit.image.as_deref(), Some("dress/red_gown.jpg"));
        assert_eq!(outfit.skin_tones, vec!["fair", "medium", "tan", "deep"]);

        let features = outfit.features.unwrap();
        assert_eq!(features.len(), FEATURE_DIMENSIONS);
        assert!(features.iter().all(|value| (0.0..1.0).contains(value)));
    }
}
