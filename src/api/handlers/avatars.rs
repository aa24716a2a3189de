use crate::api::error::AppError;
use crate::services::catalog::{self, AVATAR_PREFIX};
use crate::services::storage::PutObject;
use crate::utils::validation::{resolve_content_type, sanitize_filename, validate_file_size};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AvatarListResponse {
    pub images: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct UpdateResponse {
    pub message: String,
    pub url: String,
}

/// A file part pulled out of a multipart body
struct UploadedFile {
    field_name: String,
    file_name: String,
    content_type: String,
    data: Bytes,
}

#[utoipa::path(
    get,
    path = "/allavatars",
    responses(
        (status = 200, description = "Public URLs of all avatar images", body = AvatarListResponse),
        (status = 404, description = "No images found"),
        (status = 500, description = "Storage failure")
    ),
    tag = "avatars"
)]
pub async fn list_avatars(
    State(state): State<crate::AppState>,
) -> Result<Json<AvatarListResponse>, AppError> {
    let images = catalog::avatar_urls(state.storage.as_ref())
        .await
        .map_err(|e| AppError::upstream("Error fetching images", e))?;

    if images.is_empty() {
        return Err(AppError::NotFound("No images found".to_string()));
    }

    Ok(Json(AvatarListResponse { images }))
}

#[utoipa::path(
    get,
    path = "/avatar/{imageName}",
    params(
        ("imageName" = String, Path, description = "Object name under avatar/")
    ),
    responses(
        (status = 302, description = "Redirect to a signed read URL"),
        (status = 404, description = "Image not found"),
        (status = 500, description = "Storage failure")
    ),
    tag = "avatars"
)]
pub async fn get_avatar(
    State(state): State<crate::AppState>,
    Path(image_name): Path<String>,
) -> Result<Response, AppError> {
    const FAILURE: &str = "Error accessing the image";
    let key = catalog::avatar_key(&image_name);

    let exists = state
        .storage
        .file_exists(&key)
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;
    if !exists {
        return Err(AppError::NotFound("Image not found".to_string()));
    }

    let url = state
        .storage
        .generate_presigned_url(&key, state.config.signed_url_ttl_secs)
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;

    tracing::debug!("↪️  Redirecting {} to signed URL", key);
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Object, description = "Any multipart file field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "No file uploaded"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure")
    ),
    tag = "avatars"
)]
pub async fn upload_avatar(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    const FAILURE: &str = "Error uploading the file";

    let file = next_file(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    validate_file_size(file.data.len(), state.config.max_file_size)
        .map_err(|_| AppError::PayloadTooLarge("File too large".to_string()))?;

    let safe_name =
        sanitize_filename(&file.file_name).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let key = format!(
        "{}{}-{}",
        AVATAR_PREFIX,
        Utc::now().timestamp_millis(),
        safe_name
    );

    state
        .storage
        .upload_file(PutObject {
            key: key.clone(),
            data: file.data,
            content_type: file.content_type.clone(),
            public: state.config.public_uploads,
        })
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;

    let url = state
        .storage
        .generate_presigned_url(&key, state.config.signed_url_ttl_secs)
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;

    tracing::info!("📤 Avatar uploaded as {}", key);

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_name: file.file_name,
        file_type: file.content_type,
        url,
    }))
}

#[utoipa::path(
    put,
    path = "/avatar/{imageName}",
    params(
        ("imageName" = String, Path, description = "Object name under avatar/")
    ),
    request_body(content = Object, description = "Multipart body with a `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar replaced", body = UpdateResponse),
        (status = 400, description = "No file uploaded"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure")
    ),
    tag = "avatars"
)]
pub async fn replace_avatar(
    State(state): State<crate::AppState>,
    Path(image_name): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UpdateResponse>, AppError> {
    const FAILURE: &str = "Error updating the image";

    let file = next_file(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    if file.field_name != "file" {
        return Err(AppError::BadRequest("Unexpected field".to_string()));
    }
    validate_file_size(file.data.len(), state.config.max_file_size)
        .map_err(|_| AppError::PayloadTooLarge("File too large".to_string()))?;

    let key = catalog::avatar_key(&image_name);

    state
        .storage
        .upload_file(PutObject {
            key: key.clone(),
            data: file.data,
            content_type: file.content_type,
            public: state.config.public_uploads,
        })
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;

    let url = state
        .storage
        .generate_presigned_url(&key, state.config.signed_url_ttl_secs)
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?;

    tracing::info!("🔁 Avatar {} replaced", key);

    Ok(Json(UpdateResponse {
        message: "File updated successfully".to_string(),
        url,
    }))
}

/// Returns the first part that carries a filename, skipping plain form fields.
async fn next_file(multipart: &mut Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let field_name = field.name().unwrap_or_default().to_string();
        let declared = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        return Ok(Some(UploadedFile {
            field_name,
            file_name,
            content_type: resolve_content_type(declared.as_deref(), &data),
            data,
        }));
    }
    Ok(None)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
