pub mod api;
pub mod auth;
pub mod event;
pub mod pagination;

pub use api::*;
