use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult};

use crate::events::publisher;
use crate::models::{Match, ModerationState, NewBannedContact, NewModerationState};
use crate::schema::{banned_contacts, likes, matches, messages, moderation_states};
use crate::AppState;

pub const BAN_THRESHOLD: i32 = 3;

/// What the strike pipeline decided, before any side effects run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeDecision {
    /// User is already banned; nothing to record.
    AlreadyBanned,
    /// Count incremented, still below the threshold.
    Strike { strikes: i32, remaining: i32 },
    /// This strike reached the threshold.
    Ban { strikes: i32 },
}

/// Strikes only ever increase; a missing row counts as zero.
pub fn next_strike(current: Option<&ModerationState>) -> StrikeDecision {
    match current {
        Some(state) if state.banned => StrikeDecision::AlreadyBanned,
        Some(state) => decide(state.strikes + 1),
        None => decide(1),
    }
}

fn decide(strikes: i32) -> StrikeDecision {
    if strikes >= BAN_THRESHOLD {
        StrikeDecision::Ban { strikes }
    } else {
        StrikeDecision::Strike {
            strikes,
            remaining: BAN_THRESHOLD - strikes,
        }
    }
}

/// Outcome reported to the caller whose message was blocked.
#[derive(Debug, Serialize)]
pub struct StrikeOutcome {
    pub strikes: i32,
    pub strikes_remaining: i32,
    pub banned: bool,
    pub already_banned: bool,
}

pub fn is_banned(conn: &mut PgConnection, user_id: Uuid) -> AppResult<bool> {
    let state = moderation_states::table
        .find(user_id)
        .first::<ModerationState>(conn)
        .optional()?;
    Ok(state.map(|s| s.banned).unwrap_or(false))
}

/// Record a strike for a flagged message and run the ban cascade when the
/// threshold is reached. The flagged message itself is never stored; the
/// caller blocks submission either way.
pub async fn record_strike(
    state: &AppState,
    user_id: Uuid,
    matched_phrases: &[&str],
) -> AppResult<StrikeOutcome> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let current = moderation_states::table
        .find(user_id)
        .first::<ModerationState>(&mut conn)
        .optional()?;

    let decision = next_strike(current.as_ref());

    tracing::info!(
        user = %user_id,
        phrases = ?matched_phrases,
        decision = ?decision,
        "threat detected in outgoing message"
    );

    match decision {
        StrikeDecision::AlreadyBanned => Ok(StrikeOutcome {
            strikes: current.map(|s| s.strikes).unwrap_or(BAN_THRESHOLD),
            strikes_remaining: 0,
            banned: true,
            already_banned: true,
        }),
        StrikeDecision::Strike { strikes, remaining } => {
            persist_state(&mut conn, user_id, strikes, false)?;
            publisher::publish_strike_issued(&state.rabbitmq, user_id, strikes, remaining).await;
            Ok(StrikeOutcome {
                strikes,
                strikes_remaining: remaining,
                banned: false,
                already_banned: false,
            })
        }
        StrikeDecision::Ban { strikes } => {
            persist_state(&mut conn, user_id, strikes, true)?;
            publisher::publish_user_banned(&state.rabbitmq, user_id, strikes).await;

            let summary = run_ban_cascade(state, &mut conn, user_id).await;
            summary.log(user_id);

            Ok(StrikeOutcome {
                strikes,
                strikes_remaining: 0,
                banned: true,
                already_banned: false,
            })
        }
    }
}

fn persist_state(conn: &mut PgConnection, user_id: Uuid, strikes: i32, banned: bool) -> AppResult<()> {
    diesel::insert_into(moderation_states::table)
        .values(&NewModerationState { user_id, strikes, banned })
        .on_conflict(moderation_states::user_id)
        .do_update()
        .set((
            moderation_states::strikes.eq(strikes),
            moderation_states::banned.eq(banned),
            moderation_states::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}

// --- Ban cascade ---

/// One step of the footprint-removal cascade.
#[derive(Debug)]
pub struct CascadeStep {
    pub name: &'static str,
    pub result: Result<usize, String>,
}

#[derive(Debug, Default)]
pub struct CascadeSummary {
    pub steps: Vec<CascadeStep>,
}

impl CascadeSummary {
    fn record(&mut self, name: &'static str, result: Result<usize, String>) {
        self.steps.push(CascadeStep { name, result });
    }

    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }

    fn log(&self, user_id: Uuid) {
        for step in &self.steps {
            match &step.result {
                Ok(count) => {
                    tracing::info!(user = %user_id, step = step.name, affected = count, "ban cascade step ok")
                }
                Err(e) => {
                    tracing::warn!(user = %user_id, step = step.name, error = %e, "ban cascade step failed")
                }
            }
        }
        if self.all_ok() {
            tracing::info!(user = %user_id, "ban cascade complete");
        } else {
            tracing::warn!(user = %user_id, "ban cascade finished with failures");
        }
    }
}

/// Remove a banned user's social footprint: messages, matches, likes, stored
/// photos, plus the banned-contacts record and match-ended notifications for
/// counterparts. Every step runs even when an earlier one failed; per-step
/// errors are captured in the summary rather than aborting the cascade.
async fn run_ban_cascade(state: &AppState, conn: &mut PgConnection, user_id: Uuid) -> CascadeSummary {
    let mut summary = CascadeSummary::default();

    // Snapshot the matches first: counterpart notifications go out at the end
    // and need the pairings even after the rows are gone.
    let user_matches: Vec<Match> = match matches::table
        .filter(matches::user_lo_id.eq(user_id).or(matches::user_hi_id.eq(user_id)))
        .load::<Match>(conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            summary.record("collect_matches", Err(e.to_string()));
            Vec::new()
        }
    };
    let match_ids: Vec<Uuid> = user_matches.iter().map(|m| m.id).collect();

    let deleted_messages = diesel::delete(
        messages::table.filter(
            messages::match_id.eq_any(&match_ids).or(messages::sender_id.eq(user_id)),
        ),
    )
    .execute(conn);
    summary.record("delete_messages", deleted_messages.map_err(|e| e.to_string()));

    let deleted_matches = diesel::delete(
        matches::table.filter(matches::user_lo_id.eq(user_id).or(matches::user_hi_id.eq(user_id))),
    )
    .execute(conn);
    summary.record("delete_matches", deleted_matches.map_err(|e| e.to_string()));

    let deleted_likes = diesel::delete(
        likes::table.filter(likes::sender_id.eq(user_id).or(likes::receiver_id.eq(user_id))),
    )
    .execute(conn);
    summary.record("delete_likes", deleted_likes.map_err(|e| e.to_string()));

    let photo_prefix = format!("photos/{user_id}/");
    summary.record("delete_photos", state.minio.delete_prefix(&photo_prefix).await);

    let recorded = diesel::insert_into(banned_contacts::table)
        .values(&NewBannedContact { user_id })
        .execute(conn);
    summary.record("record_banned_contact", recorded.map_err(|e| e.to_string()));

    // Best-effort notification to each counterpart that the match is gone.
    let mut notified = 0usize;
    for m in user_matches.iter().filter(|m| m.active) {
        publisher::publish_match_ended(&state.rabbitmq, m.id, user_id, 0).await;
        notified += 1;
    }
    summary.record("notify_counterparts", Ok(notified));

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(strikes: i32, banned: bool) -> ModerationState {
        ModerationState {
            user_id: Uuid::new_v4(),
            strikes,
            banned,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn first_strike_starts_at_one() {
        assert_eq!(
            next_strike(None),
            StrikeDecision::Strike { strikes: 1, remaining: 2 }
        );
    }

    #[test]
    fn strikes_escalate_to_ban_at_three() {
        assert_eq!(
            next_strike(Some(&state(0, false))),
            StrikeDecision::Strike { strikes: 1, remaining: 2 }
        );
        assert_eq!(
            next_strike(Some(&state(1, false))),
            StrikeDecision::Strike { strikes: 2, remaining: 1 }
        );
        assert_eq!(
            next_strike(Some(&state(2, false))),
            StrikeDecision::Ban { strikes: 3 }
        );
    }

    #[test]
    fn banned_user_short_circuits() {
        assert_eq!(next_strike(Some(&state(3, true))), StrikeDecision::AlreadyBanned);
    }

    #[test]
    fn summary_reports_failures() {
        let mut summary = CascadeSummary::default();
        summary.record("delete_messages", Ok(4));
        summary.record("delete_photos", Err("storage unavailable".into()));
        assert!(!summary.all_ok());
    }
}
