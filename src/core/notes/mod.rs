// Core notes module - private notebook with owner-only access.

pub mod notes_models;
pub mod notes_service;
pub mod slugify;

pub use notes_models::*;
pub use notes_service::*;
pub use slugify::is_valid_slug;
