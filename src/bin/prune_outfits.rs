//! Removes retired categories from the outfit catalog.
//!
//! Usage: prune_outfits <category> [<category>...]

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use tracing_subscriber::EnvFilter;

use lookbook_api::config::Config;
use lookbook_api::db::{self, OUTFITS_COLLECTION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let categories: Vec<String> = std::env::args().skip(1).collect();
    if categories.is_empty() {
        anyhow::bail!("usage: prune_outfits <category> [<category>...]");
    }

    let config = Config::from_env()?;
    let database = db::connect(&config).await?;
    let outfits: Collection<Document> = database.collection(OUTFITS_COLLECTION);

    let total_before = outfits.count_documents(doc! {}).await?;
    tracing::info!(total = total_before, "Catalog before pruning");

    let mut removed = 0u64;
    for category in &categories {
        let matched = outfits
            .count_documents(doc! {"category": category})
            .await?;
        let deleted = outfits
            .delete_many(doc! {"category": category})
            .await?
            .deleted_count;
        tracing::info!(
            category = %category,
            matched = matched,
            deleted = deleted,
            "Category pruned"
        );
        removed += deleted;
    }

    let total_after = outfits.count_documents(doc! {}).await?;
    tracing::info!(removed = removed, total = total_after, "Catalog after pruning");

    let mut remaining = outfits
        .aggregate(vec![
            doc! {"$group": {"_id": "$category", "count": {"$sum": 1}}},
            doc! {"$sort": {"count": -1}},
        ])
        .await?;

    while let Some(group) = remaining.try_next().await? {
        let category = group.get_str("_id").unwrap_or("unknown");
        let count = match group.get_i64("count") {
            Ok(count) => count,
            Err(_) => group.get_i32("count").map(i64::from).unwrap_or(0),
        };
        tracing::info!(category = %category, count = count, "Remaining category");
    }

    Ok(())
}
