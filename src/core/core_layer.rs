// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "access/mod.rs"]
pub mod access;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "notes/mod.rs"]
pub mod notes;

#[path = "news/mod.rs"]
pub mod news;
