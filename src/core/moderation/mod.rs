// Core moderation module - banned-word content filter.
// Same layout as the access module: models + service.

pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
