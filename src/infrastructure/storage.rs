use crate::config::StorageConfig;
use crate::services::storage::S3StorageService;
use anyhow::{Context, Result};
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn build_client(config: &StorageConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    match (&config.access_key, &config.secret_key) {
        (Some(access_key), Some(secret_key)) => {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "static",
            ));
        }
        (None, None) => info!("🔑 Using the default AWS credential chain"),
        _ => warn!("⚠️  Only one of MINIO_ACCESS_KEY/MINIO_SECRET_KEY is set, ignoring both"),
    }

    let aws_config = loader.load().await;

    // MinIO and most self-hosted stores only speak path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

pub async fn setup_storage(
    config: &StorageConfig,
    public_base_url: &str,
) -> Result<Arc<S3StorageService>> {
    info!(
        "☁️  S3 Storage: {} (Bucket: {})",
        config.endpoint.as_deref().unwrap_or("aws default"),
        config.bucket
    );

    let s3_client = build_client(config).await;

    match s3_client.head_bucket().bucket(&config.bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", config.bucket),
        Err(e) if config.create_bucket => {
            info!("🪣 Bucket '{}' not reachable ({}), creating...", config.bucket, e);
            s3_client
                .create_bucket()
                .bucket(&config.bucket)
                .send()
                .await
                .with_context(|| format!("creating bucket '{}'", config.bucket))?;
            info!("✅ Bucket '{}' created successfully", config.bucket);
        }
        Err(e) => {
            // Requests will surface the problem as 500s; keep serving
            tracing::error!("❌ Bucket '{}' is not reachable: {}", config.bucket, e);
        }
    }

    Ok(Arc::new(S3StorageService::new(
        s3_client,
        config.bucket.clone(),
        public_base_url.to_string(),
    )))
}
