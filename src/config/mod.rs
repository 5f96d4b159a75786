use std::env;

/// Application configuration, built once at startup and injected into the
/// database, storage, and HTTP layers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: "sqlite::memory:")
    pub database_url: String,

    /// S3/MinIO endpoint URL (default: "http://127.0.0.1:9000")
    pub s3_endpoint: String,

    /// S3 access key (default: "minioadmin")
    pub s3_access_key: String,

    /// S3 secret key (default: "minioadmin")
    pub s3_secret_key: String,

    /// Bucket holding raw uploaded CSV files (default: "source-files")
    pub source_files_bucket: String,

    /// Bucket holding question/explanation images (default: "question-images")
    pub question_images_bucket: String,

    /// Shared secret for the external bridge API (Required in production)
    pub api_secret_token: String,

    /// JWT Secret Key (Required in production)
    pub jwt_secret: String,

    /// Maximum CSV upload size in bytes (default: 16 MB)
    pub max_upload_size: usize,

    /// Maximum question image size in bytes (default: 5 MB)
    pub max_image_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            s3_endpoint: "http://127.0.0.1:9000".to_string(),
            s3_access_key: "minioadmin".to_string(),
            s3_secret_key: "minioadmin".to_string(),
            source_files_bucket: "source-files".to_string(),
            question_images_bucket: "question-images".to_string(),
            api_secret_token: "secret".to_string(),
            jwt_secret: "secret".to_string(),
            max_upload_size: 16 * 1024 * 1024, // 16 MB
            max_image_size: 5 * 1024 * 1024,   // 5 MB
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            s3_endpoint: env::var("S3_ENDPOINT").unwrap_or(default.s3_endpoint),

            s3_access_key: env::var("S3_ACCESS_KEY").unwrap_or(default.s3_access_key),

            s3_secret_key: env::var("S3_SECRET_KEY").unwrap_or(default.s3_secret_key),

            source_files_bucket: env::var("SOURCE_FILES_BUCKET")
                .unwrap_or(default.source_files_bucket),

            question_images_bucket: env::var("QUESTION_IMAGES_BUCKET")
                .unwrap_or(default.question_images_bucket),

            api_secret_token: env::var("API_SECRET_TOKEN").unwrap_or(default.api_secret_token),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production method

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_image_size: env::var("MAX_IMAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_image_size),
        }
    }

    /// Create config for production (all credentials must be present)
    pub fn production() -> Self {
        let default = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").expect("CRITICAL: DATABASE_URL must be set"),
            s3_endpoint: env::var("S3_ENDPOINT").expect("CRITICAL: S3_ENDPOINT must be set"),
            s3_access_key: env::var("S3_ACCESS_KEY").expect("CRITICAL: S3_ACCESS_KEY must be set"),
            s3_secret_key: env::var("S3_SECRET_KEY").expect("CRITICAL: S3_SECRET_KEY must be set"),
            source_files_bucket: env::var("SOURCE_FILES_BUCKET")
                .unwrap_or(default.source_files_bucket),
            question_images_bucket: env::var("QUESTION_IMAGES_BUCKET")
                .unwrap_or(default.question_images_bucket),
            api_secret_token: env::var("API_SECRET_TOKEN")
                .expect("CRITICAL: API_SECRET_TOKEN must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
            max_image_size: env::var("MAX_IMAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_image_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_size, 16 * 1024 * 1024);
        assert_eq!(config.max_image_size, 5 * 1024 * 1024);
        assert_eq!(config.source_files_bucket, "source-files");
        assert_eq!(config.question_images_bucket, "question-images");
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        unsafe { env::remove_var("MAX_UPLOAD_SIZE") };
        let config = AppConfig::from_env();
        assert_eq!(config.max_upload_size, AppConfig::default().max_upload_size);
    }
}
