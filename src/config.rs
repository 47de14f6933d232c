use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// MongoDB connection URL
    #[serde(default = "default_mongo_url")]
    pub mongo_url: String,

    /// MongoDB database name
    #[serde(default = "default_mongo_db")]
    pub mongo_db: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory where uploaded user photos are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory of outfit catalog images served at /outfit_images
    #[serde(default = "default_outfit_images_dir")]
    pub outfit_images_dir: String,

    /// Path to the YOLOv8-pose ONNX model file
    #[serde(default = "default_pose_model_path")]
    pub pose_model_path: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_mongo_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongo_db() -> String {
    "lookbook".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_upload_dir() -> String {
    "storage/uploads".to_string()
}

fn default_outfit_images_dir() -> String {
    "storage/outfit_images".to_string()
}

fn default_pose_model_path() -> String {
    "models/yolov8n-pose.onnx".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
