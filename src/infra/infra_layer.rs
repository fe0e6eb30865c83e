// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

use std::path::Path;

#[path = "notes/notes_store.rs"]
pub mod notes;

#[path = "news/news_store.rs"]
pub mod news;

/// Normalize a database location into a sqlx SQLite URL.
///
/// Plain file paths get their parent directory created and open in
/// read-write-create mode. `:memory:` and full `sqlite:` URLs pass through.
pub fn sqlite_url(database_url: &str) -> std::io::Result<String> {
    if database_url.starts_with("sqlite:") {
        return Ok(database_url.to_string());
    }
    if database_url == ":memory:" {
        return Ok("sqlite::memory:".to_string());
    }

    if let Some(parent) = Path::new(database_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(format!("sqlite://{}?mode=rwc", database_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_passthrough() {
        assert_eq!(sqlite_url("sqlite::memory:").unwrap(), "sqlite::memory:");
        assert_eq!(sqlite_url(":memory:").unwrap(), "sqlite::memory:");
    }

    #[test]
    fn test_sqlite_url_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("notes.db");
        let url = sqlite_url(db.to_str().unwrap()).unwrap();

        assert!(dir.path().join("nested").is_dir());
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("notes.db?mode=rwc"));
    }
}
