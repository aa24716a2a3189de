use std::env;

/// Longest expiry S3 SigV4 accepts for a presigned URL (7 days).
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Object storage connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 endpoint URL; `None` uses the AWS default for the region
    pub endpoint: Option<String>,

    /// Static access key; `None` falls back to the default credential chain
    pub access_key: Option<String>,

    /// Static secret key
    pub secret_key: Option<String>,

    /// Bucket holding avatars and product images (default: "skincam")
    pub bucket: String,

    /// Region (default: "us-east-1")
    pub region: String,

    /// Create the bucket on startup when it does not exist (default: false)
    pub create_bucket: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            secret_key: None,
            bucket: "skincam".to_string(),
            region: "us-east-1".to_string(),
            create_bucket: false,
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub storage: StorageConfig,

    /// Base used for unsigned public object URLs, without the bucket
    pub public_base_url: String,

    /// Lifetime of signed read URLs in seconds (default and maximum: 7 days)
    pub signed_url_ttl_secs: u64,

    /// Maximum upload size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Store uploads with a public-read ACL (default: true)
    pub public_uploads: bool,

    /// Allowed CORS origins; `*` allows any
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        let public_base_url = default_public_base_url(&storage);
        Self {
            storage,
            public_base_url,
            signed_url_ttl_secs: MAX_SIGNED_URL_TTL_SECS,
            max_file_size: 10 * 1024 * 1024, // 10 MB
            public_uploads: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();
        let default_storage = default.storage;

        let storage = StorageConfig {
            endpoint: non_empty_var("MINIO_ENDPOINT"),
            access_key: non_empty_var("MINIO_ACCESS_KEY"),
            secret_key: non_empty_var("MINIO_SECRET_KEY"),
            bucket: non_empty_var("MINIO_BUCKET").unwrap_or(default_storage.bucket),
            region: non_empty_var("MINIO_REGION").unwrap_or(default_storage.region),
            create_bucket: env::var("MINIO_CREATE_BUCKET")
                .map(|v| parse_flag(&v))
                .unwrap_or(default_storage.create_bucket),
        };

        let public_base_url = non_empty_var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| default_public_base_url(&storage));

        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),

            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(clamp_ttl)
                .unwrap_or(default.signed_url_ttl_secs),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            public_uploads: env::var("PUBLIC_UPLOADS")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.public_uploads),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),

            storage,
        }
    }

    /// Local MinIO with its stock credentials
    pub fn development() -> Self {
        let storage = StorageConfig {
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            create_bucket: true,
            ..StorageConfig::default()
        };
        Self {
            public_base_url: default_public_base_url(&storage),
            storage,
            ..Self::default()
        }
    }

    /// Production: credentials from the environment chain, uploads stay private
    pub fn production() -> Self {
        Self {
            public_uploads: false,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v != "false" && v != "0" && v != "no"
}

fn clamp_ttl(secs: u64) -> u64 {
    secs.clamp(1, MAX_SIGNED_URL_TTL_SECS)
}

fn default_public_base_url(storage: &StorageConfig) -> String {
    match &storage.endpoint {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => format!("https://s3.{}.amazonaws.com", storage.region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.storage.bucket, "skincam");
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.signed_url_ttl_secs, MAX_SIGNED_URL_TTL_SECS);
        assert_eq!(config.public_base_url, "https://s3.us-east-1.amazonaws.com");
        assert!(config.public_uploads);
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_development_config() {
        let config = GatewayConfig::development();
        assert_eq!(
            config.storage.endpoint.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert_eq!(config.public_base_url, "http://127.0.0.1:9000");
        assert!(config.storage.create_bucket);
    }

    #[test]
    fn test_ttl_is_clamped_to_sigv4_limit() {
        assert_eq!(clamp_ttl(0), 1);
        assert_eq!(clamp_ttl(3600), 3600);
        assert_eq!(clamp_ttl(u64::MAX), MAX_SIGNED_URL_TTL_SECS);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("FALSE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(" no "));
    }
}
