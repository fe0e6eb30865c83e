// SQLite-backed note store.
//
// Tables:
// - notes: one row per note, `slug` carries a UNIQUE constraint
//
// The constraint is what actually guarantees unique slugs under concurrent
// writers; a violation comes back as `NoteError::DuplicateSlug`.

use crate::core::access::UserKey;
use crate::core::notes::{NewNote, Note, NoteChanges, NoteError, NoteStore};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteNoteStore {
    pool: Pool<Sqlite>,
}

impl SqliteNoteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(&crate::infra::sqlite_url(database_url)?)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), NoteError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                text TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                author INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notes_author ON notes(author, id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(())
    }

    fn row_to_note(row: &SqliteRow) -> Note {
        Note {
            id: row.get::<i64, _>("id") as u64,
            title: row.get("title"),
            text: row.get("text"),
            slug: row.get("slug"),
            author: UserKey(row.get::<i64, _>("author") as u64),
        }
    }
}

/// Turn a unique-constraint violation on `slug` into a duplicate error.
fn map_write_error(e: sqlx::Error, slug: &str) -> NoteError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            NoteError::DuplicateSlug(slug.to_string())
        }
        _ => NoteError::StorageError(e.to_string()),
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note, NoteError> {
        let result = sqlx::query(
            r#"
            INSERT INTO notes (title, text, slug, author)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .bind(note.author.0 as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &note.slug))?;

        Ok(Note {
            id: result.last_insert_rowid() as u64,
            title: note.title,
            text: note.text,
            slug: note.slug,
            author: note.author,
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>, NoteError> {
        let row = sqlx::query("SELECT id, title, text, slug, author FROM notes WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_note))
    }

    async fn list_by_author(&self, author: UserKey) -> Result<Vec<Note>, NoteError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, text, slug, author
            FROM notes
            WHERE author = ?
            ORDER BY id
            "#,
        )
        .bind(author.0 as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_note).collect())
    }

    async fn update(&self, current: &Note, changes: NoteChanges) -> Result<Note, NoteError> {
        let result = sqlx::query("UPDATE notes SET title = ?, text = ? WHERE id = ?")
            .bind(&changes.title)
            .bind(&changes.text)
            .bind(current.id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &current.slug))?;

        if result.rows_affected() == 0 {
            return Err(NoteError::StorageError(format!(
                "note {} not found",
                current.id
            )));
        }

        Ok(Note {
            title: changes.title,
            text: changes.text,
            ..current.clone()
        })
    }

    async fn delete(&self, note: &Note) -> Result<bool, NoteError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(note.id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn slug_taken(&self, slug: &str, except_id: Option<u64>) -> Result<bool, NoteError> {
        // -1 never matches an AUTOINCREMENT id.
        let except = except_id.map(|id| id as i64).unwrap_or(-1);
        let row = sqlx::query("SELECT COUNT(*) FROM notes WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(except)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) > 0)
    }

    async fn count(&self) -> Result<usize, NoteError> {
        let row = sqlx::query("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| NoteError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as usize)
    }
}
