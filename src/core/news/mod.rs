// Core news module - public feed with moderated comments.

pub mod news_models;
pub mod news_service;

pub use news_models::*;
pub use news_service::*;
