use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::FashionStore;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::services::pose::PoseEstimator;

pub mod recommend;
pub mod user;
pub mod wishlist;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FashionStore>,
    /// Absent when the pose model failed to load; uploads then degrade to an
    /// Unknown body shape instead of erroring.
    pub estimator: Option<Arc<dyn PoseEstimator>>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FashionStore>,
        estimator: Option<Arc<dyn PoseEstimator>>,
        config: Config,
    ) -> Self {
        Self {
            store,
            estimator,
            config,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/user", user::router())
        .nest("/recommend", recommend::router())
        .nest("/wishlist", wishlist::router())
        .nest_service(
            "/outfit_images",
            ServeDir::new(&state.config.outfit_images_dir),
        )
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .with_state(state)
}

/// Root endpoint used by the frontend as a liveness probe
async fn root() -> Json<Value> {
    Json(json!({ "message": "Lookbook backend is running" }))
}

/// Health check endpoint reporting database reachability
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(error) => {
            tracing::error!(error = %error, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "error" })),
            )
        }
    }
}
