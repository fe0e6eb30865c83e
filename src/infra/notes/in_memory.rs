// In-memory implementation of NoteStore.
//
// Notes are keyed by slug, so the unique-slug rule falls out of the map
// itself: inserts go through `entry()`, which checks for a vacant slot and
// fills it under the same shard lock.

use crate::core::access::UserKey;
use crate::core::notes::{NewNote, Note, NoteChanges, NoteError, NoteStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InMemoryNoteStore {
    /// Maps slug -> note
    notes: DashMap<String, Note>,
    next_id: AtomicU64,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note, NoteError> {
        match self.notes.entry(note.slug.clone()) {
            Entry::Occupied(_) => Err(NoteError::DuplicateSlug(note.slug)),
            Entry::Vacant(slot) => {
                let stored = Note {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    title: note.title,
                    text: note.text,
                    slug: note.slug,
                    author: note.author,
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>, NoteError> {
        Ok(self.notes.get(slug).map(|entry| entry.value().clone()))
    }

    async fn list_by_author(&self, author: UserKey) -> Result<Vec<Note>, NoteError> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|entry| entry.author == author)
            .map(|entry| entry.value().clone())
            .collect();
        notes.sort_by_key(|note| note.id);
        Ok(notes)
    }

    async fn update(&self, current: &Note, changes: NoteChanges) -> Result<Note, NoteError> {
        let mut entry = self
            .notes
            .get_mut(&current.slug)
            .filter(|entry| entry.id == current.id)
            .ok_or_else(|| NoteError::StorageError(format!("note {} not found", current.id)))?;

        entry.title = changes.title;
        entry.text = changes.text;
        Ok(entry.value().clone())
    }

    async fn delete(&self, note: &Note) -> Result<bool, NoteError> {
        Ok(self
            .notes
            .remove_if(&note.slug, |_, stored| stored.id == note.id)
            .is_some())
    }

    async fn slug_taken(&self, slug: &str, except_id: Option<u64>) -> Result<bool, NoteError> {
        Ok(self
            .notes
            .get(slug)
            .is_some_and(|entry| Some(entry.id) != except_id))
    }

    async fn count(&self) -> Result<usize, NoteError> {
        Ok(self.notes.len())
    }
}

impl Default for InMemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}
