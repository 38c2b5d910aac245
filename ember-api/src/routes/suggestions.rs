use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::models::{Message, Personal, Profile};
use crate::routes::matches::load_member_match;
use crate::schema::{messages, personals, profiles};
use crate::services::suggest::{self, SuggestionCategory, SuggestionContext};
use crate::AppState;

const HISTORY_LEN: i64 = 6;

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    #[serde(default = "default_category")]
    pub category: SuggestionCategory,
}

fn default_category() -> SuggestionCategory {
    SuggestionCategory::General
}

/// GET /matches/:id/suggestions - generated message ideas for this
/// conversation. Generation failures degrade to fixed fallbacks, so this
/// endpoint never errors on the model's account.
pub async fn get_suggestions(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Query(params): Query<SuggestionParams>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let matched = load_member_match(&mut conn, match_id, user.id)?;
    let other = matched.counterpart(user.id);

    let my_personal: Personal = personals::table.find(user.id).first(&mut conn)?;
    let my_profile: Profile = profiles::table.find(user.id).first(&mut conn)?;

    let their_personal: Option<Personal> =
        personals::table.find(other).first(&mut conn).optional()?;
    let their_profile: Option<Profile> =
        profiles::table.find(other).first(&mut conn).optional()?;
    let (their_personal, their_profile) = match (their_personal, their_profile) {
        (Some(p), Some(pr)) => (p, pr),
        _ => return Err(AppError::new(ErrorCode::ProfileNotFound, "profile not found")),
    };

    let mut recent: Vec<Message> = messages::table
        .filter(messages::match_id.eq(match_id))
        .order(messages::created_at.desc())
        .limit(HISTORY_LEN)
        .load(&mut conn)?;
    recent.reverse();
    drop(conn);

    let my_interests = my_profile.interest_list();
    let their_interests = their_profile.interest_list();

    let ctx = SuggestionContext {
        my_name: my_personal.display_name,
        their_name: their_personal.display_name,
        my_bio: my_profile.bio,
        their_bio: their_profile.bio,
        my_interests,
        their_interests,
        recent_messages: recent
            .into_iter()
            .map(|m| (m.sender_id == user.id, m.content))
            .collect(),
    };

    let suggestions = suggest::generate(&state.generation, &ctx, params.category).await;

    Ok(Json(ApiResponse::ok(suggestions)))
}
