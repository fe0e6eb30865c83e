// Notes service - business logic for the private notebook.
//
// This service handles:
// - Owner-scoped listing
// - Create / edit / delete gated by the access controller
// - Form cleaning and slug resolution
// - Slug uniqueness (pre-check here, hard guarantee in the store)
//
// NO transport dependencies here - just pure domain logic.

use super::notes_models::{
    slug_taken_message, too_long_message, CleanNote, NewNote, Note, NoteChanges, NoteForm,
    SLUG_EMPTY_WARNING, SLUG_FIELD, SLUG_FORMAT_WARNING,
    SLUG_IMMUTABLE_WARNING, TEXT_FIELD, TITLE_FIELD, TITLE_MAX_LEN,
};
use super::slugify::{is_valid_slug, slugify, SLUG_MAX_LEN};
use crate::core::access::{
    decide, decide_for, scope_to_owner, Action, Actor, Decision, FormErrors, Outcome, UserKey,
    REQUIRED_WARNING,
};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Raised by stores when the unique slug constraint fires.
    #[error("{}", slug_taken_message(.0))]
    DuplicateSlug(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting notes.
///
/// Implementations must enforce slug uniqueness atomically and report a
/// collision as `NoteError::DuplicateSlug`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a note, assigning its id.
    async fn insert(&self, note: NewNote) -> Result<Note, NoteError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>, NoteError>;

    /// All notes of one author, ordered by id.
    async fn list_by_author(&self, author: UserKey) -> Result<Vec<Note>, NoteError>;

    /// Apply changes to an existing note. Returns the updated note.
    async fn update(&self, current: &Note, changes: NoteChanges) -> Result<Note, NoteError>;

    /// Remove a note. Returns false if it was already gone.
    async fn delete(&self, note: &Note) -> Result<bool, NoteError>;

    /// Whether `slug` is used by any note other than `except_id`.
    async fn slug_taken(&self, slug: &str, except_id: Option<u64>) -> Result<bool, NoteError>;

    async fn count(&self) -> Result<usize, NoteError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct NotesService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NotesService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Notes of the requesting actor only.
    pub async fn list(&self, actor: &Actor) -> Result<Outcome<Vec<Note>>, NoteError> {
        if let Some(denied) = Outcome::from_denial(decide(Action::List, actor, None)) {
            return Ok(denied);
        }
        let Some(author) = actor.user_key() else {
            return Ok(Outcome::LoginRequired);
        };

        let notes = self.store.list_by_author(author).await?;
        Ok(Outcome::Done(scope_to_owner(actor, notes)))
    }

    pub async fn detail(&self, actor: &Actor, slug: &str) -> Result<Outcome<Note>, NoteError> {
        self.load_owned(Action::Detail, actor, slug).await
    }

    /// Note shown on the edit page.
    pub async fn for_edit(&self, actor: &Actor, slug: &str) -> Result<Outcome<Note>, NoteError> {
        self.load_owned(Action::Edit, actor, slug).await
    }

    /// Note shown on the delete confirmation page.
    pub async fn for_delete(&self, actor: &Actor, slug: &str) -> Result<Outcome<Note>, NoteError> {
        self.load_owned(Action::Delete, actor, slug).await
    }

    /// Access check for pages that only need a logged in user (add form, success page).
    pub fn require_login(&self, actor: &Actor) -> Outcome<()> {
        Outcome::from_denial(decide(Action::Create, actor, None)).unwrap_or(Outcome::Done(()))
    }

    pub async fn create(&self, actor: &Actor, form: &NoteForm) -> Result<Outcome<Note>, NoteError> {
        if let Some(denied) = Outcome::from_denial(decide(Action::Create, actor, None)) {
            return Ok(denied);
        }
        let Some(author) = actor.user_key() else {
            return Ok(Outcome::LoginRequired);
        };

        let clean = match self.clean(form, None).await? {
            Ok(clean) => clean,
            Err(errors) => {
                tracing::warn!(author = %author, ?errors, "Note rejected");
                return Ok(Outcome::Rejected(errors));
            }
        };

        let new_note = NewNote {
            title: clean.title,
            text: clean.text,
            slug: clean.slug,
            author,
        };

        match self.store.insert(new_note).await {
            Ok(note) => {
                tracing::info!(author = %author, note_id = note.id, slug = %note.slug, "Note created");
                Ok(Outcome::Done(note))
            }
            Err(NoteError::DuplicateSlug(slug)) => Ok(Self::slug_collision(slug)),
            Err(e) => Err(e),
        }
    }

    pub async fn edit(
        &self,
        actor: &Actor,
        slug: &str,
        form: &NoteForm,
    ) -> Result<Outcome<Note>, NoteError> {
        let current = match self.load_owned(Action::Edit, actor, slug).await? {
            Outcome::Done(note) => note,
            other => return Ok(other),
        };

        let clean = match self.clean(form, Some(&current)).await? {
            Ok(clean) => clean,
            Err(errors) => {
                tracing::warn!(note_id = current.id, ?errors, "Note edit rejected");
                return Ok(Outcome::Rejected(errors));
            }
        };

        let changes = NoteChanges {
            title: clean.title,
            text: clean.text,
        };

        match self.store.update(&current, changes).await {
            Ok(note) => {
                tracing::info!(author = %note.author, note_id = note.id, "Note edited");
                Ok(Outcome::Done(note))
            }
            Err(NoteError::DuplicateSlug(slug)) => Ok(Self::slug_collision(slug)),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, actor: &Actor, slug: &str) -> Result<Outcome<Note>, NoteError> {
        let note = match self.load_owned(Action::Delete, actor, slug).await? {
            Outcome::Done(note) => note,
            other => return Ok(other),
        };

        if !self.store.delete(&note).await? {
            // Lost a race with another delete of the same note.
            return Ok(Outcome::NotFound);
        }

        tracing::info!(author = %note.author, note_id = note.id, "Note deleted");
        Ok(Outcome::Done(note))
    }

    pub async fn count(&self) -> Result<usize, NoteError> {
        self.store.count().await
    }

    /// Load a note and run the ownership check for `action`.
    async fn load_owned(
        &self,
        action: Action,
        actor: &Actor,
        slug: &str,
    ) -> Result<Outcome<Note>, NoteError> {
        // Anonymous actors are redirected before we even look the note up.
        if decide(action, actor, None) == Decision::DenyRedirectLogin {
            return Ok(Outcome::LoginRequired);
        }

        let note = self.store.get_by_slug(slug).await?;
        match Outcome::from_denial(decide_for(action, actor, note.as_ref())) {
            Some(denied) => {
                tracing::debug!(%action, slug, "Note access denied");
                Ok(denied)
            }
            None => Ok(note.map(Outcome::Done).unwrap_or(Outcome::NotFound)),
        }
    }

    /// Validate a submitted form. `existing` is the note being edited.
    ///
    /// The outer `Result` carries store failures, the inner one form errors.
    async fn clean(
        &self,
        form: &NoteForm,
        existing: Option<&Note>,
    ) -> Result<Result<CleanNote, FormErrors>, NoteError> {
        let mut errors = FormErrors::new();

        let title = form.title.trim().to_string();
        let text = form.text.trim().to_string();

        if title.is_empty() {
            errors.add(TITLE_FIELD, REQUIRED_WARNING);
        } else {
            let len = title.chars().count();
            if len > TITLE_MAX_LEN {
                errors.add(TITLE_FIELD, too_long_message(TITLE_MAX_LEN, len));
            }
        }

        if text.is_empty() {
            errors.add(TEXT_FIELD, REQUIRED_WARNING);
        }

        let slug = match (existing, form.explicit_slug()) {
            (Some(note), Some(requested)) if requested != note.slug => {
                errors.add(SLUG_FIELD, SLUG_IMMUTABLE_WARNING);
                None
            }
            (Some(note), _) => Some(note.slug.clone()),
            (None, Some(requested)) => {
                let len = requested.chars().count();
                if len > SLUG_MAX_LEN {
                    errors.add(SLUG_FIELD, too_long_message(SLUG_MAX_LEN, len));
                    None
                } else if !is_valid_slug(requested) {
                    errors.add(SLUG_FIELD, SLUG_FORMAT_WARNING);
                    None
                } else {
                    Some(requested.to_string())
                }
            }
            (None, None) if title.is_empty() => None,
            (None, None) => {
                let derived = slugify(&title);
                if derived.is_empty() {
                    errors.add(SLUG_FIELD, SLUG_EMPTY_WARNING);
                    None
                } else {
                    Some(derived)
                }
            }
        };

        if let Some(slug) = &slug {
            let except_id = existing.map(|note| note.id);
            if self.store.slug_taken(slug, except_id).await? {
                errors.add(SLUG_FIELD, slug_taken_message(slug));
            }
        }

        match slug {
            Some(slug) if errors.is_empty() => Ok(Ok(CleanNote { title, text, slug })),
            _ => Ok(Err(errors)),
        }
    }

    fn slug_collision<T>(slug: String) -> Outcome<T> {
        tracing::warn!(slug = %slug, "Slug collision caught by store");
        Outcome::Rejected(FormErrors::single(SLUG_FIELD, slug_taken_message(&slug)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
