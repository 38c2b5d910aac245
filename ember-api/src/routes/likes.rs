use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Like, Match, NewLike, NewMatch, Personal, Profile, ProfileCard};
use crate::schema::{likes, matches, personals, profiles};
use crate::services::strikes;
use crate::services::swipes::{self, LikeAction, LikeStanding, PairState, Settlement};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendLikeRequest {
    pub receiver_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub is_match: bool,
    pub already_liked: bool,
    pub match_id: Option<Uuid>,
}

/// POST /likes - like someone; a mutual active like becomes a match.
///
/// The match table is consulted before the like rows: an existing match
/// (active or ended) decides the response on its own, so retries and stale
/// taps cannot resurrect a consumed like or reopen an ended pair. The match
/// insert relies on the unique normalized pair index with ON CONFLICT DO
/// NOTHING, so two simultaneous mutual likes still produce exactly one
/// match row.
pub async fn send_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendLikeRequest>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    if req.receiver_id == user.id {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "cannot like yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if strikes::is_banned(&mut conn, user.id)? {
        return Err(AppError::new(ErrorCode::UserBanned, "account is banned"));
    }

    let receiver_exists: Option<Uuid> = personals::table
        .find(req.receiver_id)
        .select(personals::user_id)
        .first(&mut conn)
        .optional()?;
    if receiver_exists.is_none() {
        return Err(AppError::not_found("user not found"));
    }

    let pair_key = NewMatch::for_pair(user.id, req.receiver_id);
    let pair_row: Option<Match> = matches::table
        .filter(matches::user_lo_id.eq(pair_key.user_lo_id))
        .filter(matches::user_hi_id.eq(pair_key.user_hi_id))
        .first(&mut conn)
        .optional()?;
    let pair = match &pair_row {
        Some(m) if m.active => PairState::Matched { match_id: m.id },
        Some(_) => PairState::Closed,
        None => PairState::Open,
    };

    let existing: Option<Like> = likes::table
        .filter(likes::sender_id.eq(user.id))
        .filter(likes::receiver_id.eq(req.receiver_id))
        .first(&mut conn)
        .optional()?;
    let standing = match &existing {
        Some(like) if like.active => LikeStanding::Active,
        Some(_) => LikeStanding::Inactive,
        None => LikeStanding::Missing,
    };

    let reciprocal: Option<Uuid> = likes::table
        .filter(likes::sender_id.eq(req.receiver_id))
        .filter(likes::receiver_id.eq(user.id))
        .filter(likes::active.eq(true))
        .select(likes::id)
        .first(&mut conn)
        .optional()?;

    match swipes::decide_like(pair, standing, reciprocal.is_some()) {
        LikeAction::ConfirmMatch { match_id } => Ok(Json(ApiResponse::ok(LikeResponse {
            is_match: true,
            already_liked: true,
            match_id: Some(match_id),
        }))),
        LikeAction::PairClosed => Ok(Json(ApiResponse::ok_with_message(
            LikeResponse {
                is_match: false,
                already_liked: false,
                match_id: None,
            },
            "this pairing has ended",
        ))),
        LikeAction::RecordLike { already_liked } => {
            let like_id = persist_like(&mut conn, user.id, req.receiver_id, existing)?;
            if !already_liked {
                publisher::publish_like_sent(&state.rabbitmq, like_id, user.id, req.receiver_id)
                    .await;
            }
            Ok(Json(ApiResponse::ok(LikeResponse {
                is_match: false,
                already_liked,
                match_id: None,
            })))
        }
        LikeAction::FormMatch { already_liked } => {
            persist_like(&mut conn, user.id, req.receiver_id, existing)?;

            diesel::insert_into(matches::table)
                .values(&pair_key)
                .on_conflict((matches::user_lo_id, matches::user_hi_id))
                .do_nothing()
                .execute(&mut conn)?;

            let matched: Option<Match> = matches::table
                .filter(matches::user_lo_id.eq(pair_key.user_lo_id))
                .filter(matches::user_hi_id.eq(pair_key.user_hi_id))
                .filter(matches::active.eq(true))
                .first(&mut conn)
                .optional()?;
            // The insert conflicted with a row that is already inactive: an
            // unmatch won the race, so the pair is closed.
            let Some(matched) = matched else {
                return Ok(Json(ApiResponse::ok_with_message(
                    LikeResponse {
                        is_match: false,
                        already_liked,
                        match_id: None,
                    },
                    "this pairing has ended",
                )));
            };

            // The match row is the source of truth now; like deactivation is
            // best-effort cleanup.
            let deactivated = diesel::update(
                likes::table
                    .filter(
                        likes::sender_id
                            .eq(user.id)
                            .and(likes::receiver_id.eq(req.receiver_id))
                            .or(likes::sender_id
                                .eq(req.receiver_id)
                                .and(likes::receiver_id.eq(user.id))),
                    )
                    .filter(likes::active.eq(true)),
            )
            .set((likes::active.eq(false), likes::updated_at.eq(Utc::now())));
            if let Err(e) = deactivated.execute(&mut conn) {
                tracing::warn!(match_id = %matched.id, error = %e, "failed to deactivate consumed likes");
            }

            publisher::publish_match_created(
                &state.rabbitmq,
                matched.id,
                matched.user_lo_id,
                matched.user_hi_id,
            )
            .await;

            tracing::info!(match_id = %matched.id, a = %user.id, b = %req.receiver_id, "match created");

            Ok(Json(ApiResponse::ok(LikeResponse {
                is_match: true,
                already_liked,
                match_id: Some(matched.id),
            })))
        }
    }
}

/// Insert the like, or reactivate the sender's inactive row. An active row
/// is left alone.
fn persist_like(
    conn: &mut PgConnection,
    sender_id: Uuid,
    receiver_id: Uuid,
    existing: Option<Like>,
) -> AppResult<Uuid> {
    match existing {
        Some(like) if like.active => Ok(like.id),
        Some(like) => {
            diesel::update(likes::table.find(like.id))
                .set((likes::active.eq(true), likes::updated_at.eq(Utc::now())))
                .execute(conn)?;
            Ok(like.id)
        }
        None => {
            let inserted: Like = diesel::insert_into(likes::table)
                .values(&NewLike {
                    sender_id,
                    receiver_id,
                })
                .get_result(conn)?;
            Ok(inserted.id)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiscardLikeRequest {
    pub sender_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    pub already_discarded: bool,
}

/// POST /likes/discard - pass on a received like. Idempotent: discarding a
/// like that is already gone succeeds with already_discarded set.
pub async fn discard_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscardLikeRequest>,
) -> AppResult<Json<ApiResponse<DiscardResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(
        likes::table
            .filter(likes::sender_id.eq(req.sender_id))
            .filter(likes::receiver_id.eq(user.id))
            .filter(likes::active.eq(true)),
    )
    .set((likes::active.eq(false), likes::updated_at.eq(Utc::now())))
    .execute(&mut conn)?;

    if swipes::settle(updated) == Settlement::AlreadySettled {
        return Ok(Json(ApiResponse::ok(DiscardResponse {
            already_discarded: true,
        })));
    }

    publisher::publish_like_discarded(&state.rabbitmq, req.sender_id, user.id).await;

    Ok(Json(ApiResponse::ok(DiscardResponse {
        already_discarded: false,
    })))
}

#[derive(Debug, Serialize)]
pub struct ReceivedLike {
    #[serde(flatten)]
    pub card: ProfileCard,
    pub liked_at: DateTime<Utc>,
}

/// GET /likes/received - who actively likes the caller, newest first.
pub async fn received_likes(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ReceivedLike>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Like, Personal, Profile)> = likes::table
        .filter(likes::receiver_id.eq(user.id))
        .filter(likes::active.eq(true))
        .inner_join(personals::table.on(personals::user_id.eq(likes::sender_id)))
        .inner_join(profiles::table.on(profiles::user_id.eq(likes::sender_id)))
        .order(likes::created_at.desc())
        .load(&mut conn)?;

    let today = Utc::now().date_naive();
    let cards = rows
        .into_iter()
        .map(|(like, personal, profile)| ReceivedLike {
            card: ProfileCard::from_rows(&personal, &profile, today),
            liked_at: like.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::ok(cards)))
}
