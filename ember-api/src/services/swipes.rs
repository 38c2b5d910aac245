//! Pure transitions for the like / match pair lifecycle. Routes gather the
//! current rows and apply the returned action, so the retry rules are
//! checkable without a database.

use uuid::Uuid;

/// Where a (sender, receiver) pair stands in the match table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    /// No match row exists for the normalized pair.
    Open,
    /// An active match exists.
    Matched { match_id: Uuid },
    /// The pair matched once and later unmatched; it stays closed for good.
    Closed,
}

/// The sender's own like row toward the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeStanding {
    Missing,
    Active,
    /// Discarded by the receiver, or consumed by a match.
    Inactive,
}

/// What a like request should do to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    /// Pair already matched: confirm it and touch nothing. In particular a
    /// repeat tap after the match formed must not resurrect the consumed
    /// like, or the sender reappears in the receiver's likes screen.
    ConfirmMatch { match_id: Uuid },
    /// Pair unmatched earlier: record nothing, report no match.
    PairClosed,
    /// Persist the like (insert, or reactivate an inactive row). No match.
    RecordLike { already_liked: bool },
    /// Persist the like and create the match for the pair.
    FormMatch { already_liked: bool },
}

/// The like state machine. The match table outranks the like rows: once a
/// pair has ever matched, like rows for it are history, not input.
pub fn decide_like(pair: PairState, standing: LikeStanding, reciprocal_active: bool) -> LikeAction {
    match pair {
        PairState::Matched { match_id } => LikeAction::ConfirmMatch { match_id },
        PairState::Closed => LikeAction::PairClosed,
        PairState::Open => {
            let already_liked = standing == LikeStanding::Active;
            if reciprocal_active {
                LikeAction::FormMatch { already_liked }
            } else {
                LikeAction::RecordLike { already_liked }
            }
        }
    }
}

/// Outcome of a guarded one-shot update (discard, unmatch): the first call
/// flips the row, repeats find nothing left to flip and report that instead
/// of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    AlreadySettled,
}

pub fn settle(rows_changed: usize) -> Settlement {
    if rows_changed == 0 {
        Settlement::AlreadySettled
    } else {
        Settlement::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_like_is_recorded_without_match() {
        assert_eq!(
            decide_like(PairState::Open, LikeStanding::Missing, false),
            LikeAction::RecordLike { already_liked: false }
        );
    }

    #[test]
    fn mutual_like_forms_the_match() {
        assert_eq!(
            decide_like(PairState::Open, LikeStanding::Missing, true),
            LikeAction::FormMatch { already_liked: false }
        );
    }

    #[test]
    fn repeat_like_reports_already_liked_unchanged() {
        assert_eq!(
            decide_like(PairState::Open, LikeStanding::Active, false),
            LikeAction::RecordLike { already_liked: true }
        );
    }

    #[test]
    fn discarded_like_can_be_sent_again() {
        assert_eq!(
            decide_like(PairState::Open, LikeStanding::Inactive, false),
            LikeAction::RecordLike { already_liked: false }
        );
    }

    #[test]
    fn repeat_tap_after_match_confirms_without_touching_likes() {
        // Both likes went inactive when the match formed; a retry of the
        // winning tap must confirm the existing match, not reactivate its
        // own inactive like and report no match.
        let match_id = Uuid::new_v4();
        assert_eq!(
            decide_like(PairState::Matched { match_id }, LikeStanding::Inactive, false),
            LikeAction::ConfirmMatch { match_id }
        );
        // Same answer whatever the like rows look like.
        assert_eq!(
            decide_like(PairState::Matched { match_id }, LikeStanding::Active, true),
            LikeAction::ConfirmMatch { match_id }
        );
    }

    #[test]
    fn like_after_unmatch_stays_closed() {
        // An ended match never comes back, and the stale like rows cannot
        // re-form it.
        assert_eq!(
            decide_like(PairState::Closed, LikeStanding::Inactive, false),
            LikeAction::PairClosed
        );
        assert_eq!(
            decide_like(PairState::Closed, LikeStanding::Missing, true),
            LikeAction::PairClosed
        );
    }

    #[test]
    fn one_shot_updates_settle_idempotently() {
        assert_eq!(settle(1), Settlement::Applied);
        assert_eq!(settle(3), Settlement::Applied);
        // Second discard or unmatch hits zero rows and reports done.
        assert_eq!(settle(0), Settlement::AlreadySettled);
    }
}
