use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{NewPersonal, NewProfile, Personal, Profile, UpdateProfile};
use crate::schema::{personals, profiles};
use crate::AppState;

pub const MAX_INTERESTS: usize = 10;
pub const MIN_IMAGES: usize = 3;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub personal: Personal,
    pub profile: Profile,
}

/// GET /me - the caller's personal + profile rows
pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let personal = personals::table
        .find(user.id)
        .first::<Personal>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PersonalNotFound, "complete your profile first"))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(MeResponse { personal, profile })))
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonalRequest {
    pub display_name: String,
    pub sex: String,
    pub birth_date: NaiveDate,
}

/// POST /me/personal - one-time personal record creation. An empty profile
/// row is created alongside so later edits are plain updates.
pub async fn create_personal(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePersonalRequest>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let display_name = req.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "display_name is required"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = personals::table
        .find(user.id)
        .first::<Personal>(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(AppError::new(
            ErrorCode::PersonalAlreadyExists,
            "personal record already exists",
        ));
    }

    let personal: Personal = diesel::insert_into(personals::table)
        .values(&NewPersonal {
            user_id: user.id,
            display_name: display_name.to_string(),
            sex: req.sex.to_lowercase(),
            birth_date: req.birth_date,
        })
        .get_result(&mut conn)?;

    let profile: Profile = diesel::insert_into(profiles::table)
        .values(&NewProfile {
            user_id: user.id,
            interests: serde_json::json!([]),
            image_urls: serde_json::json!([]),
        })
        .get_result(&mut conn)?;

    tracing::info!(user = %user.id, "personal record created");

    Ok(Json(ApiResponse::ok(MeResponse { personal, profile })))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub residence: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Explicitly turn location sharing off (sets both coordinates to null).
    #[serde(default)]
    pub clear_location: bool,
}

/// PATCH /me/profile
pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    if let Some(ref interests) = req.interests {
        if interests.len() > MAX_INTERESTS {
            return Err(AppError::new(
                ErrorCode::TooManyInterests,
                format!("at most {MAX_INTERESTS} interests allowed"),
            ));
        }
    }

    if let Some(ref images) = req.image_urls {
        if images.len() < MIN_IMAGES {
            return Err(AppError::new(
                ErrorCode::NotEnoughPhotos,
                format!("at least {MIN_IMAGES} photos required"),
            ));
        }
    }

    let (latitude, longitude) = if req.clear_location {
        (Some(None), Some(None))
    } else {
        (req.latitude.map(Some), req.longitude.map(Some))
    };

    let changes = UpdateProfile {
        bio: req.bio,
        interests: req.interests.map(|i| serde_json::json!(i)),
        image_urls: req.image_urls.map(|i| serde_json::json!(i)),
        residence: req.residence,
        latitude,
        longitude,
        updated_at: Some(Utc::now()),
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = diesel::update(profiles::table.find(user.id))
        .set(&changes)
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    publisher::publish_profile_updated(&state.rabbitmq, user.id).await;

    Ok(Json(ApiResponse::ok(profile)))
}
