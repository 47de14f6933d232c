use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client, Database, IndexModel,
};

use crate::config::Config;

pub mod store;

pub use store::{FashionStore, MongoStore};

#[cfg(test)]
pub use store::MockFashionStore;

pub const USERS_COLLECTION: &str = "users";
pub const USER_IMAGES_COLLECTION: &str = "user_images";
pub const USER_FEATURES_COLLECTION: &str = "user_features";
pub const OUTFITS_COLLECTION: &str = "outfits";
pub const WISHLIST_COLLECTION: &str = "wishlist";

/// Connects to MongoDB and verifies the server responds to a ping.
///
/// An unreachable server fails startup; every handler depends on the
/// database, so there is nothing useful to serve without it.
pub async fn connect(config: &Config) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&config.mongo_url).await?;
    let database = client.database(&config.mongo_db);
    database.run_command(doc! {"ping": 1}).await?;

    tracing::info!(database = %config.mongo_db, "Connected to MongoDB");
    Ok(database)
}

/// Creates the indexes the collections rely on. Safe to run on every
/// startup; existing indexes are left alone.
pub async fn ensure_indexes(database: &Database) -> anyhow::Result<()> {
    create_index(database, USERS_COLLECTION, doc! {"user_id": 1}, true).await?;
    create_index(database, USER_IMAGES_COLLECTION, doc! {"user_id": 1}, false).await?;
    create_index(database, USER_IMAGES_COLLECTION, doc! {"image_id": 1}, true).await?;
    create_index(database, USER_FEATURES_COLLECTION, doc! {"image_id": 1}, true).await?;
    create_index(database, USER_FEATURES_COLLECTION, doc! {"user_id": 1}, false).await?;
    create_index(database, OUTFITS_COLLECTION, doc! {"name": 1}, true).await?;

    tracing::debug!("Database indexes ensured");
    Ok(())
}

async fn create_index(
    database: &Database,
    collection: &str,
    keys: Document,
    unique: bool,
) -> mongodb::error::Result<()> {
    let options = IndexOptions::builder().unique(unique).build();
    let model = IndexModel::builder().keys(keys).options(options).build();
    database
        .collection::<Document>(collection)
        .create_index(model)
        .await?;
    Ok(())
}
