pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::GatewayConfig;
use crate::services::storage::StorageService;
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::from_fn,
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::avatars::list_avatars,
        api::handlers::avatars::get_avatar,
        api::handlers::avatars::upload_avatar,
        api::handlers::avatars::replace_avatar,
        api::handlers::products::list_product_folder,
        api::handlers::products::list_product_image,
        api::handlers::products::list_morning,
        api::handlers::products::list_night,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::avatars::AvatarListResponse,
            api::handlers::avatars::UploadResponse,
            api::handlers::avatars::UpdateResponse,
            api::handlers::products::CatalogResponse,
            api::handlers::health::HealthResponse,
            services::catalog::CatalogEntry,
            services::catalog::FileKind,
        )
    ),
    tags(
        (name = "avatars", description = "Avatar listing, redirects and uploads"),
        (name = "products", description = "Product image folders"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub config: GatewayConfig,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/allavatars", get(api::handlers::avatars::list_avatars))
        .route(
            "/avatar/:imageName",
            get(api::handlers::avatars::get_avatar).put(api::handlers::avatars::replace_avatar),
        )
        .route("/upload", post(api::handlers::avatars::upload_avatar))
        .route(
            "/produkimg/:routine/:subfolder",
            get(api::handlers::products::list_product_folder),
        )
        .route(
            "/produkimg/:routine/:subfolder/:imageName",
            get(api::handlers::products::list_product_image),
        )
        .route("/allpagi", get(api::handlers::products::list_morning))
        .route("/allmalam", get(api::handlers::products::list_night))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(&api::middleware::request_id::REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        // Outside the trace layer so generated ids land in the request span
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}
