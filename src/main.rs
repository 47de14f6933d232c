use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lookbook_api::config::Config;
use lookbook_api::db::{self, MongoStore};
use lookbook_api::routes::{create_router, AppState};
use lookbook_api::services::pose::{self, OrtPoseEstimator, PoseEstimator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lookbook_api=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let database = db::connect(&config).await?;
    db::ensure_indexes(&database).await?;

    let store = Arc::new(MongoStore::new(database));
    let estimator = load_estimator(&config);

    let addr = config.bind_addr();
    let state = AppState::new(store, estimator, config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Loads the pose model. When the runtime or model file is unavailable the
/// server still starts; uploads then report an Unknown body shape.
fn load_estimator(config: &Config) -> Option<Arc<dyn PoseEstimator>> {
    let model_path = Path::new(&config.pose_model_path);
    if !model_path.exists() {
        // Skip ONNX Runtime entirely; with load-dynamic, touching it
        // without the shared library installed aborts the process
        tracing::warn!(
            model = %config.pose_model_path,
            "Pose model not found, body shape analysis disabled"
        );
        return None;
    }

    let loaded = pose::init_runtime().and_then(|_| OrtPoseEstimator::from_file(model_path));

    match loaded {
        Ok(estimator) => {
            tracing::info!(
                model = %config.pose_model_path,
                backend = estimator.name(),
                "Pose model loaded"
            );
            Some(Arc::new(estimator))
        }
        Err(error) => {
            tracing::warn!(
                error = %error,
                model = %config.pose_model_path,
                "Pose model unavailable, body shape analysis disabled"
            );
            None
        }
    }
}
