use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::auth::AuthUser;
use ember_shared::types::pagination::{Paginated, PaginationParams};
use ember_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Message, NewMessage};
use crate::routes::matches::load_member_match;
use crate::schema::{matches, messages};
use crate::services::scanner;
use crate::services::strikes::{self, StrikeOutcome};
use crate::AppState;

const PREVIEW_LEN: usize = 100;

/// GET /matches/:id/messages - conversation history, newest first.
pub async fn list_messages(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    load_member_match(&mut conn, match_id, user.id)?;

    let total: i64 = messages::table
        .filter(messages::match_id.eq(match_id))
        .count()
        .get_result(&mut conn)?;

    let page: Vec<Message> = messages::table
        .filter(messages::match_id.eq(match_id))
        .order(messages::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(page, total as u64, &params))))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub blocked: bool,
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<StrikeOutcome>,
}

/// POST /matches/:id/messages - send a message into a match.
///
/// Every message passes the threat scanner before it is stored. A flagged
/// message is never persisted; the sender gets a normal 200 with blocked set
/// and the strike outcome, because the block itself is the feature working,
/// not a failure.
pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<SendMessageResponse>>> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::MessageEmpty, "message is empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if strikes::is_banned(&mut conn, user.id)? {
        return Err(AppError::new(ErrorCode::UserBanned, "account is banned"));
    }

    let matched = load_member_match(&mut conn, match_id, user.id)?;
    if !matched.active {
        return Err(AppError::new(ErrorCode::MatchNotFound, "match has ended"));
    }
    drop(conn);

    let scan = scanner::scan(content);
    if scan.is_threat {
        tracing::warn!(
            user = %user.id,
            match_id = %match_id,
            phrases = ?scan.matched,
            "threatening message blocked"
        );
        let outcome = strikes::record_strike(&state, user.id, &scan.matched).await?;
        return Ok(Json(ApiResponse::ok_with_message(
            SendMessageResponse {
                blocked: true,
                message: None,
                moderation: Some(outcome),
            },
            "message blocked by moderation",
        )));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            match_id,
            sender_id: user.id,
            content: content.to_string(),
        })
        .get_result(&mut conn)?;

    let preview: String = message.content.chars().take(PREVIEW_LEN).collect();
    publisher::publish_message_sent(&state.rabbitmq, message.id, match_id, user.id, &preview).await;

    Ok(Json(ApiResponse::ok(SendMessageResponse {
        blocked: false,
        message: Some(message),
        moderation: None,
    })))
}

#[derive(Debug, Serialize)]
pub struct ReadReceipt {
    pub marked_read: i64,
}

/// POST /matches/:id/read - mark the counterpart's messages as read.
pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReadReceipt>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    load_member_match(&mut conn, match_id, user.id)?;

    let marked = diesel::update(
        messages::table
            .filter(messages::match_id.eq(match_id))
            .filter(messages::sender_id.ne(user.id))
            .filter(messages::read.eq(false)),
    )
    .set(messages::read.eq(true))
    .execute(&mut conn)? as i64;

    Ok(Json(ApiResponse::ok(ReadReceipt { marked_read: marked })))
}

/// DELETE /messages/:id - sender-only hard delete of a single message.
pub async fn delete_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let message: Option<Message> = messages::table
        .find(message_id)
        .first(&mut conn)
        .optional()?;
    let message =
        message.ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if message.sender_id != user.id {
        return Err(AppError::forbidden("only the sender can delete a message"));
    }

    diesel::delete(messages::table.find(message_id)).execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(())))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// GET /unread-count - unread messages across the caller's active matches.
pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let match_ids: Vec<Uuid> = matches::table
        .filter(matches::user_lo_id.eq(user.id).or(matches::user_hi_id.eq(user.id)))
        .filter(matches::active.eq(true))
        .select(matches::id)
        .load(&mut conn)?;

    let unread: i64 = messages::table
        .filter(messages::match_id.eq_any(&match_ids))
        .filter(messages::sender_id.ne(user.id))
        .filter(messages::read.eq(false))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(UnreadCount { unread })))
}
