use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::AppState;

/// Per-user swipe preferences, stored as one JSON blob in Redis. Unset
/// fields fall back to defaults at read time, so old blobs stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipePreferences {
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub preferred_sex: Option<String>,
}

fn default_max_distance() -> f64 { 50.0 }

impl Default for SwipePreferences {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
            age_min: None,
            age_max: None,
            preferred_sex: None,
        }
    }
}

fn prefs_key(user_id: Uuid) -> String {
    format!("prefs:{user_id}")
}

pub async fn load_preferences(state: &AppState, user_id: Uuid) -> SwipePreferences {
    match state.redis.get(&prefs_key(user_id)).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(user = %user_id, error = %e, "corrupt preference blob, using defaults");
            SwipePreferences::default()
        }),
        Ok(None) => SwipePreferences::default(),
        Err(e) => {
            tracing::warn!(user = %user_id, error = %e, "preference read failed, using defaults");
            SwipePreferences::default()
        }
    }
}

/// GET /me/preferences
pub async fn get_preferences(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<SwipePreferences>>> {
    Ok(Json(ApiResponse::ok(load_preferences(&state, user.id).await)))
}

/// PUT /me/preferences
pub async fn put_preferences(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<SwipePreferences>,
) -> AppResult<Json<ApiResponse<SwipePreferences>>> {
    if prefs.max_distance <= 0.0 {
        return Err(AppError::new(ErrorCode::ValidationError, "max_distance must be positive"));
    }
    if let (Some(min), Some(max)) = (prefs.age_min, prefs.age_max) {
        if min > max {
            return Err(AppError::new(ErrorCode::ValidationError, "age_min must not exceed age_max"));
        }
    }

    let raw = serde_json::to_string(&prefs)
        .map_err(|e| AppError::internal(format!("preference serialize failed: {e}")))?;

    state
        .redis
        .set(&prefs_key(user.id), &raw)
        .await
        .map_err(|e| AppError::internal(format!("preference write failed: {e}")))?;

    Ok(Json(ApiResponse::ok(prefs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let prefs: SwipePreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.max_distance, 50.0);
        assert!(prefs.age_min.is_none());
        assert!(prefs.preferred_sex.is_none());
    }
}
