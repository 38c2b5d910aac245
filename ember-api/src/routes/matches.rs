use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Match, Message, Personal, Profile, ProfileCard};
use crate::schema::{matches, messages, personals, profiles};
use crate::services::swipes::{self, Settlement};
use crate::AppState;

/// Loads a match and verifies the caller belongs to it. A match the caller
/// is not part of is reported as not found, never as forbidden, so match
/// ids leak nothing.
pub(crate) fn load_member_match(
    conn: &mut PgConnection,
    match_id: Uuid,
    user_id: Uuid,
) -> AppResult<Match> {
    let matched: Option<Match> = matches::table.find(match_id).first(conn).optional()?;
    match matched {
        Some(m) if m.involves(user_id) => Ok(m),
        _ => Err(AppError::new(ErrorCode::MatchNotFound, "match not found")),
    }
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub matched_at: DateTime<Utc>,
    pub counterpart: ProfileCard,
    pub last_message: Option<MessagePreview>,
}

#[derive(Debug, Serialize)]
pub struct MessagePreview {
    pub content: String,
    pub from_me: bool,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// GET /matches - the caller's active matches with a last-message preview,
/// most recent activity first.
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MatchSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let my_matches: Vec<Match> = matches::table
        .filter(matches::user_lo_id.eq(user.id).or(matches::user_hi_id.eq(user.id)))
        .filter(matches::active.eq(true))
        .order(matches::created_at.desc())
        .load(&mut conn)?;

    let today = Utc::now().date_naive();
    let mut summaries = Vec::with_capacity(my_matches.len());

    for m in my_matches {
        let other = m.counterpart(user.id);

        let personal: Option<Personal> =
            personals::table.find(other).first(&mut conn).optional()?;
        let profile: Option<Profile> =
            profiles::table.find(other).first(&mut conn).optional()?;
        let (personal, profile) = match (personal, profile) {
            (Some(p), Some(pr)) => (p, pr),
            // Counterpart rows can disappear mid-listing (ban cascade);
            // skip rather than fail the whole screen.
            _ => continue,
        };

        let last: Option<Message> = messages::table
            .filter(messages::match_id.eq(m.id))
            .order(messages::created_at.desc())
            .first(&mut conn)
            .optional()?;

        summaries.push(MatchSummary {
            match_id: m.id,
            matched_at: m.created_at,
            counterpart: ProfileCard::from_rows(&personal, &profile, today),
            last_message: last.map(|msg| MessagePreview {
                from_me: msg.sender_id == user.id,
                content: msg.content,
                sent_at: msg.created_at,
                read: msg.read,
            }),
        });
    }

    Ok(Json(ApiResponse::ok(summaries)))
}

#[derive(Debug, Serialize)]
pub struct UnmatchResponse {
    pub already_unmatched: bool,
    pub messages_deleted: usize,
}

/// DELETE /matches/:id - end a match. The conversation is deleted for both
/// sides and the pair never reappears in either feed. Repeating the call
/// succeeds with already_unmatched set.
pub async fn unmatch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UnmatchResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let matched = load_member_match(&mut conn, match_id, user.id)?;

    let deleted = diesel::delete(messages::table.filter(messages::match_id.eq(match_id)))
        .execute(&mut conn)?;

    let deactivated = diesel::update(
        matches::table
            .filter(matches::id.eq(match_id))
            .filter(matches::active.eq(true)),
    )
    .set((matches::active.eq(false), matches::updated_at.eq(Utc::now())))
    .execute(&mut conn)?;

    if swipes::settle(deactivated) == Settlement::AlreadySettled {
        return Ok(Json(ApiResponse::ok(UnmatchResponse {
            already_unmatched: true,
            messages_deleted: deleted,
        })));
    }

    publisher::publish_match_ended(&state.rabbitmq, matched.id, user.id, deleted).await;

    tracing::info!(match_id = %match_id, by = %user.id, messages_deleted = deleted, "match ended");

    Ok(Json(ApiResponse::ok(UnmatchResponse {
        already_unmatched: false,
        messages_deleted: deleted,
    })))
}
