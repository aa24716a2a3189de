use clap::Parser;
use dotenvy::dotenv;
use skincam_gateway::config::GatewayConfig;
use skincam_gateway::infrastructure::storage;
use skincam_gateway::{AppState, create_app};
use std::net::{IpAddr, SocketAddr};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the HTTP server
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skincam_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Skincam Gateway...");

    let config = GatewayConfig::from_env();
    info!(
        "🛠️  Config: Bucket={}, Max Upload={}KB, Signed URL TTL={}s, Public Uploads={}",
        config.storage.bucket,
        config.max_file_size / 1024,
        config.signed_url_ttl_secs,
        config.public_uploads
    );

    let storage_service = storage::setup_storage(&config.storage, &config.public_base_url).await?;

    let state = AppState {
        storage: storage_service,
        config,
    };

    let app = create_app(state);
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Server listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Gateway exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
