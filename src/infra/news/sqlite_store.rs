// SQLite-backed news store.
//
// Tables:
// - news: public news items
// - comments: user comments, cascade-deleted with their news item
//
// Timestamps are stored as fixed-width RFC 3339 strings so that ORDER BY on
// the text column matches chronological order.

use crate::core::access::UserKey;
use crate::core::news::{Comment, NewComment, NewNews, News, NewsError, NewsStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteNewsStore {
    pool: Pool<Sqlite>,
}

impl SqliteNewsStore {
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
    pub async fn migrate(&self) -> Result<(), NewsError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                text TEXT NOT NULL,
                date TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_news_date ON news(date, id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
                author INTEGER NOT NULL,
                text TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_news_created
                ON comments(news_id, created, id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        Ok(())
    }

    fn row_to_news(row: &SqliteRow) -> Result<News, NewsError> {
        let date: String = row.get("date");
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| NewsError::StorageError(format!("bad news date {}: {}", date, e)))?;

        Ok(News {
            id: row.get::<i64, _>("id") as u64,
            title: row.get("title"),
            text: row.get("text"),
            date,
        })
    }

    fn row_to_comment(row: &SqliteRow) -> Result<Comment, NewsError> {
        let created: String = row.get("created");
        let created = DateTime::parse_from_rfc3339(&created)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                NewsError::StorageError(format!("bad comment timestamp {}: {}", created, e))
            })?;

        Ok(Comment {
            id: row.get::<i64, _>("id") as u64,
            news_id: row.get::<i64, _>("news_id") as u64,
            author: UserKey(row.get::<i64, _>("author") as u64),
            text: row.get("text"),
            created,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl NewsStore for SqliteNewsStore {
    async fn insert_news(&self, news: NewNews) -> Result<News, NewsError> {
        let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
            .bind(&news.title)
            .bind(&news.text)
            .bind(news.date.format(DATE_FORMAT).to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| NewsError::StorageError(e.to_string()))?;

        Ok(News {
            id: result.last_insert_rowid() as u64,
            title: news.title,
            text: news.text,
            date: news.date,
        })
    }

    async fn get_news(&self, id: u64) -> Result<Option<News>, NewsError> {
        let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsError::StorageError(e.to_string()))?;

        row.as_ref().map(Self::row_to_news).transpose()
    }

    async fn latest_news(&self, limit: usize) -> Result<Vec<News>, NewsError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, text, date
            FROM news
            ORDER BY date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        rows.iter().map(Self::row_to_news).collect()
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, NewsError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (news_id, author, text, created)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM news WHERE id = ?)
            "#,
        )
        .bind(comment.news_id as i64)
        .bind(comment.author.0 as i64)
        .bind(&comment.text)
        .bind(format_timestamp(&comment.created))
        .bind(comment.news_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(NewsError::StorageError(format!(
                "news {} not found",
                comment.news_id
            )));
        }

        Ok(Comment {
            id: result.last_insert_rowid() as u64,
            news_id: comment.news_id,
            author: comment.author,
            text: comment.text,
            created: comment.created,
        })
    }

    async fn get_comment(&self, id: u64) -> Result<Option<Comment>, NewsError> {
        let row = sqlx::query(
            "SELECT id, news_id, author, text, created FROM comments WHERE id = ?",
        )
        .bind(id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        row.as_ref().map(Self::row_to_comment).transpose()
    }

    async fn comments_for(&self, news_id: u64) -> Result<Vec<Comment>, NewsError> {
        let rows = sqlx::query(
            r#"
            SELECT id, news_id, author, text, created
            FROM comments
            WHERE news_id = ?
            ORDER BY created ASC, id ASC
            "#,
        )
        .bind(news_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NewsError::StorageError(e.to_string()))?;

        rows.iter().map(Self::row_to_comment).collect()
    }

    async fn update_comment_text(&self, id: u64, text: &str) -> Result<Option<Comment>, NewsError> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| NewsError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_comment(id).await
    }

    async fn delete_comment(&self, id: u64) -> Result<bool, NewsError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| NewsError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn comment_count(&self) -> Result<usize, NewsError> {
        let row = sqlx::query("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| NewsError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};

    async fn store() -> SqliteNewsStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteNewsStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    async fn publish(store: &SqliteNewsStore, title: &str, date: NaiveDate) -> News {
        store
            .insert_news(NewNews {
                title: title.to_string(),
                text: "Просто текст.".to_string(),
                date,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_latest_news_sorted_and_limited() {
        let store = store().await;
        let today = Utc::now().date_naive();
        for index in 0..5 {
            publish(&store, &format!("Новость {}", index), today - Duration::days(index)).await;
        }

        let latest = store.latest_news(3).await.unwrap();
        let titles: Vec<_> = latest.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["Новость 0", "Новость 1", "Новость 2"]);
    }

    #[tokio::test]
    async fn test_comments_ordered_by_created() {
        let store = store().await;
        let news = publish(&store, "Заголовок", Utc::now().date_naive()).await;
        let now = Utc::now();

        for index in [2i64, 0, 1] {
            store
                .insert_comment(NewComment {
                    news_id: news.id,
                    author: UserKey(1),
                    text: format!("Текст {}", index),
                    created: now + Duration::days(index),
                })
                .await
                .unwrap();
        }

        let comments = store.comments_for(news.id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Текст 0", "Текст 1", "Текст 2"]);
        // Stored with microsecond precision.
        assert_eq!(comments[0].created, now.trunc_subsecs(6));
    }

    #[tokio::test]
    async fn test_comment_on_missing_news_fails() {
        let store = store().await;
        let result = store
            .insert_comment(NewComment {
                news_id: 42,
                author: UserKey(1),
                text: "text".to_string(),
                created: Utc::now(),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.comment_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_comment() {
        let store = store().await;
        let news = publish(&store, "Заголовок", Utc::now().date_naive()).await;
        let comment = store
            .insert_comment(NewComment {
                news_id: news.id,
                author: UserKey(1),
                text: "text".to_string(),
                created: Utc::now(),
            })
            .await
            .unwrap();

        let updated = store
            .update_comment_text(comment.id, "Новый текст")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "Новый текст");
        assert_eq!(updated.author, UserKey(1));

        assert!(store.delete_comment(comment.id).await.unwrap());
        assert_eq!(store.update_comment_text(comment.id, "x").await.unwrap(), None);
        assert_eq!(store.comment_count().await.unwrap(), 0);
    }
}
