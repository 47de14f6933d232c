use std::path::{Path as FilePath, PathBuf};

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{User, UserFeatures, UserImage};
use crate::services::{body_shape, skin_tone};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .route("/features/:image_id", get(get_features))
        .route("/images/:id", get(list_images).delete(delete_image))
        .route("/images/detail/:image_id", get(get_image_detail))
        .route("/profile/:user_id", get(get_profile).post(update_profile))
}

// Request/Response types

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub body_type: String,
    pub skin_tone: String,
    pub body_type_confidence: f64,
    pub skin_tone_confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct FeaturesBody {
    pub image_id: String,
    pub user_id: String,
    pub body_type: String,
    pub body_type_confidence: f64,
    pub skin_tone: String,
    pub skin_tone_confidence: f64,
    pub shoulder_hip_ratio: f64,
    pub waist_hip_ratio: f64,
    pub created_at: DateTime<Utc>,
}

impl From<UserFeatures> for FeaturesBody {
    fn from(features: UserFeatures) -> Self {
        Self {
            image_id: features.image_id,
            user_id: features.user_id,
            body_type: features.body_type.to_string(),
            body_type_confidence: features.body_type_confidence,
            skin_tone: features.skin_tone.to_string(),
            skin_tone_confidence: features.skin_tone_confidence,
            shoulder_hip_ratio: features.shoulder_hip_ratio,
            waist_hip_ratio: features.waist_hip_ratio,
            created_at: features.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub success: bool,
    pub features: FeaturesBody,
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub image_id: String,
    pub user_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<UserImage> for ImageSummary {
    fn from(image: UserImage) -> Self {
        Self {
            image_id: image.image_id,
            user_id: image.user_id,
            file_path: image.file_path,
            file_name: image.file_name,
            file_size: image.file_size,
            uploaded_at: image.uploaded_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub success: bool,
    pub user_id: String,
    pub images: Vec<ImageSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ImageDetailResponse {
    pub success: bool,
    pub image: ImageSummary,
}

// Handlers

/// Accepts a multipart upload, runs body shape and skin tone analysis, and
/// persists both the image metadata and the derived features.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut user_id: Option<String> = None;
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| AppError::InvalidInput("No filename provided".to_string()))?;
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?.to_vec();
                upload = Some((file_name, content_type, bytes));
            }
            Some("user_id") => {
                user_id = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    if !content_type.starts_with("image/") {
        return Err(AppError::InvalidInput("File must be an image".to_string()));
    }

    let user_id = user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "default_user".to_string());

    // Decode before touching the filesystem so a bad upload leaves no file behind
    let image = image::load_from_memory(&bytes)
        .map_err(|_| AppError::InvalidImage("Invalid image file".to_string()))?;

    let image_id = Uuid::new_v4().to_string();
    let saved_name = format!("{}{}", image_id, file_extension(&file_name));
    let file_path = PathBuf::from(&state.config.upload_dir).join(&saved_name);

    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    tokio::fs::write(&file_path, &bytes).await?;
    let file_size = bytes.len() as u64;

    tracing::info!(
        image_id = %image_id,
        user_id = %user_id,
        file_size = file_size,
        "Image uploaded"
    );

    // Pose inference and pixel scans are CPU-bound
    let estimator = state.estimator.clone();
    let (body, skin) = tokio::task::spawn_blocking(move || {
        let keypoints = estimator.as_deref().and_then(|estimator| {
            estimator.estimate(&image).unwrap_or_else(|error| {
                tracing::warn!(error = %error, "Pose estimation failed");
                None
            })
        });
        let body = body_shape::analyze(keypoints.as_ref());
        let skin = skin_tone::analyze(&image);
        (body, skin)
    })
    .await
    .map_err(|error| AppError::Internal(error.to_string()))?;

    tracing::info!(
        image_id = %image_id,
        body_type = %body.body_type,
        skin_tone = %skin.skin_tone,
        "Image analyzed"
    );

    let image_record = UserImage {
        id: None,
        image_id: image_id.clone(),
        user_id: user_id.clone(),
        file_path: file_path.to_string_lossy().into_owned(),
        file_name: file_name.clone(),
        file_size,
        uploaded_at: mongodb::bson::DateTime::now(),
    };
    state.store.insert_user_image(&image_record).await?;

    let features = UserFeatures {
        id: None,
        image_id: image_id.clone(),
        user_id,
        body_type: body.body_type,
        body_type_confidence: body.confidence,
        skin_tone: skin.skin_tone,
        skin_tone_confidence: skin.confidence,
        shoulder_hip_ratio: body.shoulder_hip_ratio,
        waist_hip_ratio: body.waist_hip_ratio,
        created_at: mongodb::bson::DateTime::now(),
    };
    state.store.insert_user_features(&features).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "Image uploaded and analyzed successfully".to_string(),
        image_id,
        file_name,
        body_type: body.body_type.to_string(),
        skin_tone: skin.skin_tone.to_string(),
        body_type_confidence: body.confidence,
        skin_tone_confidence: skin.confidence,
    }))
}

/// Returns the analysis results stored for an uploaded image
pub async fn get_features(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> AppResult<Json<FeaturesResponse>> {
    let features = state
        .store
        .find_features(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Features not found for this image".to_string()))?;

    Ok(Json(FeaturesResponse {
        success: true,
        features: features.into(),
    }))
}

/// Lists a user's uploads, newest first
pub async fn list_images(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ImageListResponse>> {
    let images: Vec<ImageSummary> = state
        .store
        .find_user_images(&user_id)
        .await?
        .into_iter()
        .map(ImageSummary::from)
        .collect();
    let total = images.len();

    Ok(Json(ImageListResponse {
        success: true,
        user_id,
        images,
        total,
    }))
}

pub async fn get_image_detail(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> AppResult<Json<ImageDetailResponse>> {
    let image = state
        .store
        .find_user_image(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok(Json(ImageDetailResponse {
        success: true,
        image: image.into(),
    }))
}

/// Removes an upload, its file on disk, and its derived features
pub async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> AppResult<Json<Value>> {
    let image = state
        .store
        .find_user_image(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    if let Err(error) = tokio::fs::remove_file(&image.file_path).await {
        if error.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                error = %error,
                path = %image.file_path,
                "Failed to remove uploaded file"
            );
        }
    }

    state.store.delete_user_image(&image_id).await?;
    tracing::info!(image_id = %image_id, "Image deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Image deleted successfully"
    })))
}

/// Fetches a profile, creating an empty one on first access
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let profile = match state.store.find_user(&user_id).await? {
        Some(profile) => profile,
        None => {
            let user = User::new(user_id.clone());
            state.store.create_user(&user).await?;
            tracing::info!(user_id = %user_id, "Created user profile");
            doc! {
                "user_id": &user.user_id,
                "created_at": user.created_at,
            }
        }
    };

    let image_count = state.store.count_user_images(&user_id).await?;

    let mut user = bson_to_json(Bson::Document(profile));
    if let Some(fields) = user.as_object_mut() {
        fields.remove("_id");
    }

    Ok(Json(json!({
        "success": true,
        "user": user,
        "image_count": image_count,
    })))
}

/// Merges arbitrary profile fields into the user document
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> AppResult<Json<Value>> {
    let fields = Document::try_from(fields)
        .map_err(|_| AppError::InvalidInput("Invalid profile data".to_string()))?;

    state.store.update_user_profile(&user_id, fields).await?;
    tracing::info!(user_id = %user_id, "User profile updated");

    Ok(Json(json!({
        "success": true,
        "message": "User profile updated"
    })))
}

/// Extension of the original filename including the dot, or empty
fn file_extension(file_name: &str) -> String {
    FilePath::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{}", extension))
        .unwrap_or_default()
}

/// Converts a profile document to plain JSON, rendering timestamps as RFC 3339
/// strings and object ids as hex instead of extended JSON
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::DateTime(timestamp) => {
            Value::String(timestamp.try_to_rfc3339_string().unwrap_or_default())
        }
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;
    use mongodb::bson::oid::ObjectId;

    use super::*;
    use crate::config::Config;
    use crate::db::MockFashionStore;
    use crate::models::{BodyShape, SkinTone};

    fn create_test_config() -> Config {
        Config {
            mongo_url: "mongodb://localhost:27017".to_string(),
            mongo_db: "lookbook_test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: std::env::temp_dir()
                .join("lookbook-upload-tests")
                .to_string_lossy()
                .into_owned(),
            outfit_images_dir: "storage/outfit_images".to_string(),
            pose_model_path: "models/yolov8n-pose.onnx".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }

    fn create_test_state(store: MockFashionStore) -> AppState {
        AppState::new(Arc::new(store), None, create_test_config())
    }

    fn create_test_features() -> UserFeatures {
        UserFeatures {
            id: None,
            image_id: "img-1".to_string(),
            user_id: "default_user".to_string(),
            body_type: BodyShape::Pear,
            body_type_confidence: 0.85,
            skin_tone: SkinTone::Medium,
            skin_tone_confidence: 0.80,
            shoulder_hip_ratio: 0.85,
            waist_hip_ratio: 0.82,
            created_at: mongodb::bson::DateTime::now(),
        }
    }

    fn create_test_image() -> UserImage {
        UserImage {
            id: None,
            image_id: "img-1".to_string(),
            user_id: "default_user".to_string(),
            file_path: "/nonexistent/lookbook/img-1.jpg".to_string(),
            file_name: "photo.jpg".to_string(),
            file_size: 1024,
            uploaded_at: mongodb::bson::DateTime::now(),
        }
    }

    #[tokio::test]
    async fn test_get_features_not_found() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_features()
            .with(eq("missing"))
            .returning(|_| Ok(None));

        let state = create_test_state(store);
        let result = get_features(State(state), Path("missing".to_string())).await;

        match result {
            Err(AppError::NotFound(message)) => {
                assert_eq!(message, "Features not found for this image");
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_get_features_returns_labels() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_features()
            .with(eq("img-1"))
            .returning(|_| Ok(Some(create_test_features())));

        let state = create_test_state(store);
        let Json(response) = get_features(State(state), Path("img-1".to_string()))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.features.body_type, "Pear");
        assert_eq!(response.features.skin_tone, "Medium");
    }

    #[tokio::test]
    async fn test_list_images_counts_results() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_user_images()
            .with(eq("default_user"))
            .returning(|_| Ok(vec![create_test_image(), create_test_image()]));

        let state = create_test_state(store);
        let Json(response) = list_images(State(state), Path("default_user".to_string()))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.total, 2);
        assert_eq!(response.user_id, "default_user");
    }

    #[tokio::test]
    async fn test_get_image_detail_not_found() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_user_image()
            .with(eq("missing"))
            .returning(|_| Ok(None));

        let state = create_test_state(store);
        let result = get_image_detail(State(state), Path("missing".to_string())).await;

        match result {
            Err(AppError::NotFound(message)) => assert_eq!(message, "Image not found"),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_delete_image_not_found() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_user_image()
            .with(eq("missing"))
            .returning(|_| Ok(None));
        store.expect_delete_user_image().times(0);

        let state = create_test_state(store);
        let result = delete_image(State(state), Path("missing".to_string())).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_image_removes_records() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_user_image()
            .with(eq("img-1"))
            .returning(|_| Ok(Some(create_test_image())));
        store
            .expect_delete_user_image()
            .with(eq("img-1"))
            .returning(|_| Ok(1));

        let state = create_test_state(store);
        let Json(response) = delete_image(State(state), Path("img-1".to_string()))
            .await
            .unwrap();

        assert_eq!(response["success"], true);
        assert_eq!(response["message"], "Image deleted successfully");
    }

    #[tokio::test]
    async fn test_get_profile_creates_missing_user() {
        let mut store = MockFashionStore::new();
        store
            .expect_find_user()
            .with(eq("new-user"))
            .returning(|_| Ok(None));
        store
            .expect_create_user()
            .withf(|user: &User| user.user_id == "new-user")
            .returning(|_| Ok(()));
        store
            .expect_count_user_images()
            .with(eq("new-user"))
            .returning(|_| Ok(0));

        let state = create_test_state(store);
        let Json(response) = get_profile(State(state), Path("new-user".to_string()))
            .await
            .unwrap();

        assert_eq!(response["success"], true);
        assert_eq!(response["user"]["user_id"], "new-user");
        assert_eq!(response["image_count"], 0);
    }

    #[tokio::test]
    async fn test_get_profile_strips_object_id() {
        let mut store = MockFashionStore::new();
        store.expect_find_user().returning(|_| {
            Ok(Some(doc! {
                "_id": ObjectId::new(),
                "user_id": "default_user",
                "display_name": "Asha",
                "created_at": mongodb::bson::DateTime::now(),
            }))
        });
        store.expect_count_user_images().returning(|_| Ok(3));

        let state = create_test_state(store);
        let Json(response) = get_profile(State(state), Path("default_user".to_string()))
            .await
            .unwrap();

        assert!(response["user"].get("_id").is_none());
        assert_eq!(response["user"]["display_name"], "Asha");
        assert_eq!(response["image_count"], 3);
    }

    #[tokio::test]
    async fn test_update_profile_merges_fields() {
        let mut store = MockFashionStore::new();
        store
            .expect_update_user_profile()
            .withf(|user_id: &str, fields: &Document| {
                user_id == "default_user" && fields.get_str("display_name") == Ok("Asha")
            })
            .returning(|_, _| Ok(()));

        let state = create_test_state(store);
        let mut fields = Map::new();
        fields.insert("display_name".to_string(), Value::String("Asha".to_string()));

        let Json(response) = update_profile(
            State(state),
            Path("default_user".to_string()),
            Json(fields),
        )
        .await
        .unwrap();

        assert_eq!(response["message"], "User profile updated");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.jpg"), ".jpg");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("no_extension"), "");
    }

    #[test]
    fn test_bson_to_json_renders_timestamps() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "created_at": mongodb::bson::DateTime::from_millis(0),
            "tags": ["a", "b"],
            "count": 2_i64,
        };

        let value = bson_to_json(Bson::Document(document));
        assert_eq!(value["_id"], id.to_hex());
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
        assert_eq!(value["tags"][0], "a");
        assert_eq!(value["count"], 2);
    }
}
