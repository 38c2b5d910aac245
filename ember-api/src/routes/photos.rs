use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::profiles;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub url: String,
    pub images: Vec<String>,
}

/// POST /me/photos - multipart upload into the caller's photo folder, URL
/// appended to the profile image list.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoResponse>>> {
    let mut file_data: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read file: {e}")))?;
            file_data = Some((data.to_vec(), content_type));
        }
    }

    let (data, content_type) = file_data
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "no file provided"))?;

    let ext = match content_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                "unsupported format, accepted: jpeg, png, webp",
            ));
        }
    };

    let photo_id = Uuid::now_v7();
    let key = format!("photos/{}/{}.{}", user.id, photo_id, ext);

    let url = state
        .minio
        .upload(&key, data, &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut images = profile.image_list();
    images.push(url.clone());

    diesel::update(profiles::table.find(user.id))
        .set((
            profiles::image_urls.eq(serde_json::json!(images)),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    tracing::info!(user = %user.id, key = %key, "photo uploaded");

    Ok(Json(ApiResponse::ok(PhotoResponse { url, images })))
}

#[derive(Debug, Deserialize)]
pub struct DeletePhotoRequest {
    pub url: String,
}

/// DELETE /me/photos - remove one photo by URL from storage and the profile.
pub async fn delete_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeletePhotoRequest>,
) -> AppResult<Json<ApiResponse<PhotoResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut images = profile.image_list();
    let before = images.len();
    images.retain(|u| u != &req.url);

    if images.len() == before {
        return Err(AppError::new(ErrorCode::PhotoNotFound, "photo not on profile"));
    }

    // Storage removal is secondary: the profile no longer references the
    // object, so a failed delete only leaves an orphan behind.
    if let Some(key) = state.minio.key_for_url(&req.url) {
        if let Err(e) = state.minio.delete(&key).await {
            tracing::warn!(user = %user.id, key = %key, error = %e, "photo object delete failed");
        }
    }

    diesel::update(profiles::table.find(user.id))
        .set((
            profiles::image_urls.eq(serde_json::json!(images)),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(PhotoResponse {
        url: req.url,
        images,
    })))
}
