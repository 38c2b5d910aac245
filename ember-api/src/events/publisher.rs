use uuid::Uuid;

use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::types::event::{payloads, routing_keys, Event};

const SOURCE: &str = "ember-api";

pub async fn publish_like_sent(rabbitmq: &RabbitMQClient, like_id: Uuid, sender_id: Uuid, receiver_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_LIKE_SENT,
        payloads::LikeSent {
            like_id,
            sender_id,
            receiver_id,
        },
    )
    .with_user(sender_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_LIKE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish like.sent event");
    }
}

pub async fn publish_like_discarded(rabbitmq: &RabbitMQClient, sender_id: Uuid, receiver_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_LIKE_DISCARDED,
        payloads::LikeDiscarded {
            sender_id,
            receiver_id,
        },
    )
    .with_user(receiver_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_LIKE_DISCARDED, &event).await {
        tracing::error!(error = %e, "failed to publish like.discarded event");
    }
}

pub async fn publish_match_created(rabbitmq: &RabbitMQClient, match_id: Uuid, user_lo_id: Uuid, user_hi_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_MATCH_CREATED,
        payloads::MatchCreated {
            match_id,
            user_lo_id,
            user_hi_id,
        },
    );

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_MATCH_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish match.created event");
    }
}

pub async fn publish_match_ended(rabbitmq: &RabbitMQClient, match_id: Uuid, ended_by: Uuid, messages_deleted: usize) {
    let event = Event::new(
        SOURCE,
        routing_keys::MATCHING_MATCH_ENDED,
        payloads::MatchEnded {
            match_id,
            ended_by,
            messages_deleted,
        },
    )
    .with_user(ended_by);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_MATCH_ENDED, &event).await {
        tracing::error!(error = %e, "failed to publish match.ended event");
    }
}

pub async fn publish_message_sent(
    rabbitmq: &RabbitMQClient,
    message_id: Uuid,
    match_id: Uuid,
    sender_id: Uuid,
    content_preview: &str,
) {
    let event = Event::new(
        SOURCE,
        routing_keys::MESSAGING_MESSAGE_SENT,
        payloads::MessageSent {
            message_id,
            match_id,
            sender_id,
            content_preview: content_preview.to_string(),
        },
    )
    .with_user(sender_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MESSAGING_MESSAGE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish message.sent event");
    }
}

pub async fn publish_profile_updated(rabbitmq: &RabbitMQClient, user_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::PROFILE_UPDATED,
        payloads::ProfileUpdated { user_id },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PROFILE_UPDATED, &event).await {
        tracing::error!(error = %e, "failed to publish profile.updated event");
    }
}

pub async fn publish_strike_issued(rabbitmq: &RabbitMQClient, user_id: Uuid, strikes: i32, remaining: i32) {
    let event = Event::new(
        SOURCE,
        routing_keys::MODERATION_STRIKE_ISSUED,
        payloads::StrikeIssued {
            user_id,
            strikes,
            remaining,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_STRIKE_ISSUED, &event).await {
        tracing::error!(error = %e, "failed to publish strike.issued event");
    }
}

pub async fn publish_user_banned(rabbitmq: &RabbitMQClient, user_id: Uuid, strikes: i32) {
    let event = Event::new(
        SOURCE,
        routing_keys::MODERATION_USER_BANNED,
        payloads::UserBanned { user_id, strikes },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_USER_BANNED, &event).await {
        tracing::error!(error = %e, "failed to publish user.banned event");
    }
}
