use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::models::{Personal, Profile};
use crate::routes::preferences::load_preferences;
use crate::schema::{likes, matches, moderation_states, personals, profiles};
use crate::services::candidates::{self, Candidate, Viewer};
use crate::services::strikes;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub limit: Option<i64>,
    pub max_distance: Option<f64>,
    /// Fresh device fix; takes precedence over the stored geolocation.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// GET /feed - the swipe deck.
///
/// Exclusions are the feed's core invariant: anyone the caller actively
/// likes, anyone actively liking the caller, and every ever-matched
/// counterpart (active or not) stays out of the deck, in both directions.
pub async fn get_feed(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<ApiResponse<Vec<Candidate>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if strikes::is_banned(&mut conn, user.id)? {
        return Err(AppError::new(ErrorCode::UserBanned, "account is banned"));
    }

    // Onboarding gate: no personal record, no feed.
    let onboarded: Option<Personal> = personals::table
        .find(user.id)
        .first::<Personal>(&mut conn)
        .optional()?;
    if onboarded.is_none() {
        return Err(AppError::new(ErrorCode::PersonalNotFound, "complete your profile first"));
    }

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let excluded = exclusion_set(&mut conn, user.id)?;

    let prefs = load_preferences(&state, user.id).await;

    let geolocation = match (params.lat, params.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => profile.geolocation(),
    };

    let viewer = Viewer {
        user_id: user.id,
        interests: profile.interest_list(),
        geolocation,
        residence: profile.residence.clone(),
        max_distance: params.max_distance.unwrap_or(prefs.max_distance),
        age_range: match (prefs.age_min, prefs.age_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        },
    };

    let excluded_ids: Vec<Uuid> = excluded.into_iter().collect();

    let mut query = personals::table
        .inner_join(profiles::table)
        .filter(personals::user_id.ne(user.id))
        .filter(personals::user_id.ne_all(&excluded_ids))
        .into_boxed();

    if let Some(ref sex) = prefs.preferred_sex {
        query = query.filter(personals::sex.eq(sex.to_lowercase()));
    }

    let rows: Vec<(Personal, Profile)> = query
        .limit(state.config.candidate_pool_size)
        .load::<(Personal, Profile)>(&mut conn)?;

    let limit = params
        .limit
        .unwrap_or(state.config.feed_page_size)
        .clamp(1, 50) as usize;

    let page = candidates::rank(&viewer, &rows, Utc::now().date_naive(), limit);

    tracing::debug!(
        user = %user.id,
        pool = rows.len(),
        returned = page.len(),
        "swipe feed assembled"
    );

    Ok(Json(ApiResponse::ok(page)))
}

/// Everyone the caller must not see: active likes in either direction,
/// ever-matched counterparts, and banned users.
fn exclusion_set(conn: &mut PgConnection, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
    let mut excluded: HashSet<Uuid> = HashSet::new();

    let liked: Vec<Uuid> = likes::table
        .filter(likes::sender_id.eq(user_id))
        .filter(likes::active.eq(true))
        .select(likes::receiver_id)
        .load(conn)?;
    excluded.extend(liked);

    let likers: Vec<Uuid> = likes::table
        .filter(likes::receiver_id.eq(user_id))
        .filter(likes::active.eq(true))
        .select(likes::sender_id)
        .load(conn)?;
    excluded.extend(likers);

    // Matched pairs never resurface, even after an unmatch.
    let pairs: Vec<(Uuid, Uuid)> = matches::table
        .filter(matches::user_lo_id.eq(user_id).or(matches::user_hi_id.eq(user_id)))
        .select((matches::user_lo_id, matches::user_hi_id))
        .load(conn)?;
    for (lo, hi) in pairs {
        excluded.insert(if lo == user_id { hi } else { lo });
    }

    let banned: Vec<Uuid> = moderation_states::table
        .filter(moderation_states::banned.eq(true))
        .select(moderation_states::user_id)
        .load(conn)?;
    excluded.extend(banned);

    Ok(excluded)
}
