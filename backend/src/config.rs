use std::env;
use std::path::PathBuf;

/// Process configuration, read once at startup. Every value has a
/// development default so a bare `cargo run` works; production
/// deployments override via the environment or a .env file.
#[derive(Clone)]
pub struct Config {
    pub model_url: String,
    pub model_path: PathBuf,
    pub database_url: String,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
    pub port: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            model_url: env::var("MODEL_URL").unwrap_or_else(|_| {
                "https://example.com/models/fake_image_classifier.pt".to_string()
            }),
            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "fake_image_classifier.pt".to_string())
                .into(),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://predictions.db".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your_default_secret_key".to_string()),
            uploads_dir: env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            port: env::var("PORT").unwrap_or_else(|_| "8081".to_string()),
        }
    }
}
