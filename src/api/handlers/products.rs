use crate::api::error::AppError;
use crate::services::catalog::{self, Catalog, CatalogEntry, Routine};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    pub files: Vec<CatalogEntry>,
}

const FAILURE: &str = "Error accessing the folder";

fn parse_routine(routine: &str) -> Result<Routine, AppError> {
    routine
        .parse()
        .map_err(|_| AppError::NotFound("Not Found".to_string()))
}

async fn catalog_response(
    state: &crate::AppState,
    prefix: &str,
) -> Result<Json<CatalogResponse>, AppError> {
    let catalog = catalog::catalog_prefix(
        state.storage.as_ref(),
        prefix,
        state.config.signed_url_ttl_secs,
    )
    .await
    .map_err(|e| AppError::upstream(FAILURE, e))?;

    match catalog {
        Catalog::Empty => Err(AppError::NotFound(
            "No files found in the folder".to_string(),
        )),
        Catalog::Unsupported => Err(AppError::NotFound(
            "No supported files found in the folder".to_string(),
        )),
        Catalog::Entries(files) => {
            tracing::debug!("Catalogued {} files under '{}'", files.len(), prefix);
            Ok(Json(CatalogResponse { files }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/produkimg/{routine}/{subfolder}",
    params(
        ("routine" = String, Path, description = "`pagi` or `malam`"),
        ("subfolder" = String, Path, description = "Product folder")
    ),
    responses(
        (status = 200, description = "Signed URLs of images and text files", body = CatalogResponse),
        (status = 404, description = "No (supported) files found in the folder"),
        (status = 500, description = "Storage failure")
    ),
    tag = "products"
)]
pub async fn list_product_folder(
    State(state): State<crate::AppState>,
    Path((routine, subfolder)): Path<(String, String)>,
) -> Result<Json<CatalogResponse>, AppError> {
    let routine = parse_routine(&routine)?;
    catalog_response(&state, &routine.folder_prefix(&subfolder, None)).await
}

#[utoipa::path(
    get,
    path = "/produkimg/{routine}/{subfolder}/{imageName}",
    params(
        ("routine" = String, Path, description = "`pagi` or `malam`"),
        ("subfolder" = String, Path, description = "Product folder"),
        ("imageName" = String, Path, description = "Object name prefix inside the folder")
    ),
    responses(
        (status = 200, description = "Signed URLs of matching images and text files", body = CatalogResponse),
        (status = 404, description = "No (supported) files found in the folder"),
        (status = 500, description = "Storage failure")
    ),
    tag = "products"
)]
pub async fn list_product_image(
    State(state): State<crate::AppState>,
    Path((routine, subfolder, image_name)): Path<(String, String, String)>,
) -> Result<Json<CatalogResponse>, AppError> {
    let routine = parse_routine(&routine)?;
    catalog_response(&state, &routine.folder_prefix(&subfolder, Some(&image_name))).await
}

#[utoipa::path(
    get,
    path = "/allpagi",
    responses(
        (status = 200, description = "Every supported file of the morning routine", body = CatalogResponse),
        (status = 404, description = "No (supported) files found in the folder"),
        (status = 500, description = "Storage failure")
    ),
    tag = "products"
)]
pub async fn list_morning(
    State(state): State<crate::AppState>,
) -> Result<Json<CatalogResponse>, AppError> {
    catalog_response(&state, &Routine::Morning.root_prefix()).await
}

#[utoipa::path(
    get,
    path = "/allmalam",
    responses(
        (status = 200, description = "Every supported file of the night routine", body = CatalogResponse),
        (status = 404, description = "No (supported) files found in the folder"),
        (status = 500, description = "Storage failure")
    ),
    tag = "products"
)]
pub async fn list_night(
    State(state): State<crate::AppState>,
) -> Result<Json<CatalogResponse>, AppError> {
    catalog_response(&state, &Routine::Night.root_prefix()).await
}
