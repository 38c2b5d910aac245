use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{banned_contacts, likes, matches, messages, moderation_states, personals, profiles};

// --- Personal ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = personals, primary_key(user_id))]
pub struct Personal {
    pub user_id: Uuid,
    pub display_name: String,
    pub sex: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = personals)]
pub struct NewPersonal {
    pub user_id: Uuid,
    pub display_name: String,
    pub sex: String,
    pub birth_date: NaiveDate,
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles, primary_key(user_id))]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub interests: serde_json::Value,
    pub image_urls: serde_json::Value,
    pub residence: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn interest_list(&self) -> Vec<String> {
        json_string_array(&self.interests)
    }

    pub fn image_list(&self) -> Vec<String> {
        json_string_array(&self.image_urls)
    }

    /// (lat, lon) when location sharing is on; None falls back to residence.
    pub fn geolocation(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

fn json_string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub interests: serde_json::Value,
    pub image_urls: serde_json::Value,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub bio: Option<String>,
    pub interests: Option<serde_json::Value>,
    pub image_urls: Option<serde_json::Value>,
    pub residence: Option<String>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub user_lo_id: Uuid,
    pub user_hi_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_lo_id == user_id || self.user_hi_id == user_id
    }

    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.user_lo_id == user_id {
            self.user_hi_id
        } else {
            self.user_lo_id
        }
    }
}

/// The pair is stored normalized so the unique (user_lo_id, user_hi_id) index
/// enforces at most one match per unordered pair.
#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user_lo_id: Uuid,
    pub user_hi_id: Uuid,
}

impl NewMatch {
    pub fn for_pair(a: Uuid, b: Uuid) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self {
            user_lo_id: lo,
            user_hi_id: hi,
        }
    }
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

// --- Moderation state ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = moderation_states, primary_key(user_id))]
pub struct ModerationState {
    pub user_id: Uuid,
    pub strikes: i32,
    pub banned: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = moderation_states)]
pub struct NewModerationState {
    pub user_id: Uuid,
    pub strikes: i32,
    pub banned: bool,
}

// --- Banned contact ---

#[derive(Debug, Insertable)]
#[diesel(table_name = banned_contacts)]
pub struct NewBannedContact {
    pub user_id: Uuid,
}

// --- Shared view model ---

/// What the swipe deck and likes screens render for another user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProfileCard {
    pub user_id: Uuid,
    pub name: String,
    pub age: i32,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub images: Vec<String>,
}

impl ProfileCard {
    pub fn from_rows(personal: &Personal, profile: &Profile, today: NaiveDate) -> Self {
        Self {
            user_id: personal.user_id,
            name: personal.display_name.clone(),
            age: crate::services::candidates::age_on(personal.birth_date, today),
            bio: profile.bio.clone(),
            interests: profile.interest_list(),
            images: profile.image_list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_match_normalizes_pair_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m1 = NewMatch::for_pair(a, b);
        let m2 = NewMatch::for_pair(b, a);
        assert_eq!(m1.user_lo_id, m2.user_lo_id);
        assert_eq!(m1.user_hi_id, m2.user_hi_id);
        assert!(m1.user_lo_id <= m1.user_hi_id);
    }

    #[test]
    fn profile_lists_tolerate_malformed_json() {
        let profile = Profile {
            user_id: Uuid::new_v4(),
            bio: None,
            interests: serde_json::json!({"not": "an array"}),
            image_urls: serde_json::json!(["a.jpg", 42, "b.jpg"]),
            residence: None,
            latitude: None,
            longitude: None,
            updated_at: Utc::now(),
        };
        assert!(profile.interest_list().is_empty());
        assert_eq!(profile.image_list(), vec!["a.jpg", "b.jpg"]);
    }
}
