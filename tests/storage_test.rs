//! Round trip against a real S3 endpoint. Needs a local MinIO:
//! `docker run -p 9000:9000 minio/minio server /data`, then
//! `cargo test -- --ignored`.

use bytes::Bytes;
use skincam_gateway::config::GatewayConfig;
use skincam_gateway::infrastructure::storage::setup_storage;
use skincam_gateway::services::catalog::{self, Catalog, FileKind};
use skincam_gateway::services::storage::{PutObject, StorageService};

#[tokio::test]
#[ignore = "requires MinIO on 127.0.0.1:9000"]
async fn test_minio_upload_list_and_sign() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut config = GatewayConfig::development();
    config.storage.bucket = "skincam-test".to_string();
    let storage = setup_storage(&config.storage, &config.public_base_url)
        .await
        .unwrap();

    let run = uuid::Uuid::new_v4();
    let folder = format!("produkimg/pagi/it-{}", run);

    for (name, content_type) in [("front.png", "image/png"), ("howto.txt", "text/plain")] {
        storage
            .upload_file(PutObject {
                key: format!("{}/{}", folder, name),
                data: Bytes::from_static(b"integration"),
                content_type: content_type.to_string(),
                public: false,
            })
            .await
            .unwrap();
    }

    assert!(storage.file_exists(&format!("{}/front.png", folder)).await.unwrap());
    assert!(!storage.file_exists(&format!("{}/missing.png", folder)).await.unwrap());

    let Catalog::Entries(entries) = catalog::catalog_prefix(storage.as_ref(), &folder, 600)
        .await
        .unwrap()
    else {
        panic!("expected catalogue entries under {}", folder);
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, FileKind::Image);
    assert!(entries[0].url.contains("X-Amz-Signature"));
    assert_eq!(entries[1].kind, FileKind::Text);
}
