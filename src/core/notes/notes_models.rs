// Notes domain models.

use crate::core::access::{Owned, UserKey};
use serde::{Deserialize, Serialize};

/// Longest title a note may carry.
pub const TITLE_MAX_LEN: usize = 100;

pub const TITLE_FIELD: &str = "title";
pub const TEXT_FIELD: &str = "text";
pub const SLUG_FIELD: &str = "slug";

/// Appended to a colliding slug in the form error.
pub const SLUG_TAKEN_WARNING: &str =
    " - такой slug уже существует, придумайте уникальное значение!";
pub const SLUG_FORMAT_WARNING: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчеркивания или дефиса.";
pub const SLUG_EMPTY_WARNING: &str =
    "Не удалось сформировать slug из заголовка, укажите его вручную.";
pub const SLUG_IMMUTABLE_WARNING: &str = "Slug заметки нельзя изменить.";

/// Form error for a slug that already belongs to another note.
pub fn slug_taken_message(slug: &str) -> String {
    format!("{}{}", slug, SLUG_TAKEN_WARNING)
}

/// Form error for a value longer than `max` characters.
pub fn too_long_message(max: usize, actual: usize) -> String {
    format!(
        "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
        max, actual
    )
}

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub text: String,
    /// Globally unique, never changes once the note exists
    pub slug: String,
    pub author: UserKey,
}

impl Owned for Note {
    fn owner(&self) -> UserKey {
        self.author
    }
}

/// A note that passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author: UserKey,
}

/// Fields an edit may change. Author and slug are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: String,
    pub text: String,
}

/// Raw note form as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl NoteForm {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Explicit slug, with blank input treated as "not supplied".
    pub fn explicit_slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Form fields after trimming and slug resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}
