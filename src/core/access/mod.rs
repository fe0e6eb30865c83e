// Core access module - ownership based authorization.
// Same layout as the moderation module: models + service.

pub mod access_models;
pub mod access_service;

pub use access_models::*;
pub use access_service::*;
