use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime, Document},
    Collection, Database,
};

use crate::error::AppResult;
use crate::models::{Outfit, User, UserFeatures, UserImage, WishlistItem};

use super::{
    OUTFITS_COLLECTION, USERS_COLLECTION, USER_FEATURES_COLLECTION, USER_IMAGES_COLLECTION,
    WISHLIST_COLLECTION,
};

/// Persistence operations the route handlers depend on.
///
/// Handlers only see this trait, which keeps them testable without a
/// running MongoDB instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FashionStore: Send + Sync {
    /// Round-trip to the server, used by the health endpoint
    async fn ping(&self) -> AppResult<()>;

    async fn insert_user_image(&self, image: &UserImage) -> AppResult<()>;

    async fn insert_user_features(&self, features: &UserFeatures) -> AppResult<()>;

    async fn find_features(&self, image_id: &str) -> AppResult<Option<UserFeatures>>;

    async fn find_user_image(&self, image_id: &str) -> AppResult<Option<UserImage>>;

    /// All uploads for a user, newest first
    async fn find_user_images(&self, user_id: &str) -> AppResult<Vec<UserImage>>;

    async fn count_user_images(&self, user_id: &str) -> AppResult<u64>;

    /// Deletes the image record and its derived features. Returns how many
    /// image records were removed (0 or 1).
    async fn delete_user_image(&self, image_id: &str) -> AppResult<u64>;

    async fn find_outfits(&self, filter: Document, limit: i64) -> AppResult<Vec<Outfit>>;

    async fn wishlist_find(
        &self,
        user_id: &str,
        outfit_name: &str,
    ) -> AppResult<Option<WishlistItem>>;

    /// Inserts a wishlist entry and returns its id as a hex string
    async fn wishlist_insert(&self, item: &WishlistItem) -> AppResult<String>;

    async fn wishlist_remove(&self, user_id: &str, outfit_name: &str) -> AppResult<u64>;

    async fn wishlist_clear(&self, user_id: &str) -> AppResult<u64>;

    /// All wishlist entries for a user, newest first
    async fn wishlist_items(&self, user_id: &str) -> AppResult<Vec<WishlistItem>>;

    async fn wishlist_count(&self, user_id: &str) -> AppResult<u64>;

    /// Raw profile document; profiles carry schemaless client fields
    async fn find_user(&self, user_id: &str) -> AppResult<Option<Document>>;

    async fn create_user(&self, user: &User) -> AppResult<()>;

    /// `$set` merge of the given fields plus an `updated_at` stamp,
    /// creating the profile when missing
    async fn update_user_profile(&self, user_id: &str, fields: Document) -> AppResult<()>;
}

/// MongoDB-backed store over the five application collections
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn user_images(&self) -> Collection<UserImage> {
        self.database.collection(USER_IMAGES_COLLECTION)
    }

    fn user_features(&self) -> Collection<UserFeatures> {
        self.database.collection(USER_FEATURES_COLLECTION)
    }

    fn outfits(&self) -> Collection<Outfit> {
        self.database.collection(OUTFITS_COLLECTION)
    }

    fn wishlist(&self) -> Collection<WishlistItem> {
        self.database.collection(WISHLIST_COLLECTION)
    }

    fn users(&self) -> Collection<User> {
        self.database.collection(USERS_COLLECTION)
    }

    fn users_raw(&self) -> Collection<Document> {
        self.database.collection(USERS_COLLECTION)
    }
}

#[async_trait]
impl FashionStore for MongoStore {
    async fn ping(&self) -> AppResult<()> {
        self.database.run_command(doc! {"ping": 1}).await?;
        Ok(())
    }

    async fn insert_user_image(&self, image: &UserImage) -> AppResult<()> {
        self.user_images().insert_one(image).await?;
        Ok(())
    }

    async fn insert_user_features(&self, features: &UserFeatures) -> AppResult<()> {
        self.user_features().insert_one(features).await?;
        Ok(())
    }

    async fn find_features(&self, image_id: &str) -> AppResult<Option<UserFeatures>> {
        Ok(self
            .user_features()
            .find_one(doc! {"image_id": image_id})
            .await?)
    }

    async fn find_user_image(&self, image_id: &str) -> AppResult<Option<UserImage>> {
        Ok(self
            .user_images()
            .find_one(doc! {"image_id": image_id})
            .await?)
    }

    async fn find_user_images(&self, user_id: &str) -> AppResult<Vec<UserImage>> {
        let cursor = self
            .user_images()
            .find(doc! {"user_id": user_id})
            .sort(doc! {"uploaded_at": -1})
            .await?;
        let images: Vec<UserImage> = cursor.try_collect().await?;
        Ok(images)
    }

    async fn count_user_images(&self, user_id: &str) -> AppResult<u64> {
        Ok(self
            .user_images()
            .count_documents(doc! {"user_id": user_id})
            .await?)
    }

    async fn delete_user_image(&self, image_id: &str) -> AppResult<u64> {
        let deleted = self
            .user_images()
            .delete_one(doc! {"image_id": image_id})
            .await?;
        self.user_features()
            .delete_one(doc! {"image_id": image_id})
            .await?;
        Ok(deleted.deleted_count)
    }

    async fn find_outfits(&self, filter: Document, limit: i64) -> AppResult<Vec<Outfit>> {
        let cursor = self.outfits().find(filter).limit(limit).await?;
        let outfits: Vec<Outfit> = cursor.try_collect().await?;
        Ok(outfits)
    }

    async fn wishlist_find(
        &self,
        user_id: &str,
        outfit_name: &str,
    ) -> AppResult<Option<WishlistItem>> {
        Ok(self
            .wishlist()
            .find_one(doc! {"user_id": user_id, "outfit_name": outfit_name})
            .await?)
    }

    async fn wishlist_insert(&self, item: &WishlistItem) -> AppResult<String> {
        let result = self.wishlist().insert_one(item).await?;
        Ok(result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .unwrap_or_default())
    }

    async fn wishlist_remove(&self, user_id: &str, outfit_name: &str) -> AppResult<u64> {
        let result = self
            .wishlist()
            .delete_one(doc! {"user_id": user_id, "outfit_name": outfit_name})
            .await?;
        Ok(result.deleted_count)
    }

    async fn wishlist_clear(&self, user_id: &str) -> AppResult<u64> {
        let result = self
            .wishlist()
            .delete_many(doc! {"user_id": user_id})
            .await?;
        Ok(result.deleted_count)
    }

    async fn wishlist_items(&self, user_id: &str) -> AppResult<Vec<WishlistItem>> {
        let cursor = self
            .wishlist()
            .find(doc! {"user_id": user_id})
            .sort(doc! {"saved_date": -1})
            .await?;
        let items: Vec<WishlistItem> = cursor.try_collect().await?;
        Ok(items)
    }

    async fn wishlist_count(&self, user_id: &str) -> AppResult<u64> {
        Ok(self
            .wishlist()
            .count_documents(doc! {"user_id": user_id})
            .await?)
    }

    async fn find_user(&self, user_id: &str) -> AppResult<Option<Document>> {
        Ok(self
            .users_raw()
            .find_one(doc! {"user_id": user_id})
            .await?)
    }

    async fn create_user(&self, user: &User) -> AppResult<()> {
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn update_user_profile(&self, user_id: &str, fields: Document) -> AppResult<()> {
        let mut update = fields;
        update.insert("updated_at", DateTime::now());
        self.users_raw()
            .update_one(doc! {"user_id": user_id}, doc! {"$set": update})
            .upsert(true)
            .await?;
        Ok(())
    }
}
