pub mod feed;
pub mod health;
pub mod likes;
pub mod matches;
pub mod messages;
pub mod photos;
pub mod preferences;
pub mod profile;
pub mod suggestions;
