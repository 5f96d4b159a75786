use crate::config::AppConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> Arc<S3StorageService> {
    info!(
        "☁️  S3 Storage: {} (Buckets: {}, {})",
        config.s3_endpoint, config.source_files_bucket, config.question_images_bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.s3_endpoint)
        .region(Region::new("us-east-1"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    for bucket in [&config.source_files_bucket, &config.question_images_bucket] {
        match s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
            Err(_) => {
                info!("🪣 Bucket '{}' not found, creating...", bucket);
                if let Err(e) = s3_client.create_bucket().bucket(bucket).send().await {
                    tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
                } else {
                    info!("✅ Bucket '{}' created successfully", bucket);
                }
            }
        }
    }

    Arc::new(S3StorageService::new(
        s3_client,
        config.s3_endpoint.clone(),
    ))
}
