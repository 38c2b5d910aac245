use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `ember.{domain}.{entity}.{action}`
/// Example: `ember.matching.match.created`
///
/// This is the push side of the app: clients that used to subscribe to the
/// hosted change feed subscribe to these keys instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Matching events
    pub const MATCHING_LIKE_SENT: &str = "ember.matching.like.sent";
    pub const MATCHING_LIKE_DISCARDED: &str = "ember.matching.like.discarded";
    pub const MATCHING_MATCH_CREATED: &str = "ember.matching.match.created";
    pub const MATCHING_MATCH_ENDED: &str = "ember.matching.match.ended";

    // Messaging events
    pub const MESSAGING_MESSAGE_SENT: &str = "ember.messaging.message.sent";

    // Profile events
    pub const PROFILE_UPDATED: &str = "ember.profile.profile.updated";

    // Moderation events
    pub const MODERATION_STRIKE_ISSUED: &str = "ember.moderation.strike.issued";
    pub const MODERATION_USER_BANNED: &str = "ember.moderation.user.banned";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LikeSent {
        pub like_id: Uuid,
        pub sender_id: Uuid,
        pub receiver_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LikeDiscarded {
        pub sender_id: Uuid,
        pub receiver_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchCreated {
        pub match_id: Uuid,
        pub user_lo_id: Uuid,
        pub user_hi_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchEnded {
        pub match_id: Uuid,
        pub ended_by: Uuid,
        pub messages_deleted: usize,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub match_id: Uuid,
        pub sender_id: Uuid,
        pub content_preview: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ProfileUpdated {
        pub user_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct StrikeIssued {
        pub user_id: Uuid,
        pub strikes: i32,
        pub remaining: i32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserBanned {
        pub user_id: Uuid,
        pub strikes: i32,
    }
}
