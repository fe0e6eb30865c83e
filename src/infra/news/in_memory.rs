// In-memory implementation of NewsStore.

use crate::core::news::{Comment, NewComment, NewNews, News, NewsError, NewsStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InMemoryNewsStore {
    news: DashMap<u64, News>,
    comments: DashMap<u64, Comment>,
    next_news_id: AtomicU64,
    next_comment_id: AtomicU64,
}

impl InMemoryNewsStore {
    pub fn new() -> Self {
        Self {
            news: DashMap::new(),
            comments: DashMap::new(),
            next_news_id: AtomicU64::new(1),
            next_comment_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl NewsStore for InMemoryNewsStore {
    async fn insert_news(&self, news: NewNews) -> Result<News, NewsError> {
        let stored = News {
            id: self.next_news_id.fetch_add(1, Ordering::Relaxed),
            title: news.title,
            text: news.text,
            date: news.date,
        };
        self.news.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_news(&self, id: u64) -> Result<Option<News>, NewsError> {
        Ok(self.news.get(&id).map(|entry| entry.value().clone()))
    }

    async fn latest_news(&self, limit: usize) -> Result<Vec<News>, NewsError> {
        let mut items: Vec<News> = self.news.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        items.truncate(limit);
        Ok(items)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, NewsError> {
        if !self.news.contains_key(&comment.news_id) {
            return Err(NewsError::StorageError(format!(
                "news {} not found",
                comment.news_id
            )));
        }

        let stored = Comment {
            id: self.next_comment_id.fetch_add(1, Ordering::Relaxed),
            news_id: comment.news_id,
            author: comment.author,
            text: comment.text,
            created: comment.created,
        };
        self.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_comment(&self, id: u64) -> Result<Option<Comment>, NewsError> {
        Ok(self.comments.get(&id).map(|entry| entry.value().clone()))
    }

    async fn comments_for(&self, news_id: u64) -> Result<Vec<Comment>, NewsError> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| entry.news_id == news_id)
            .map(|entry| entry.value().clone())
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn update_comment_text(&self, id: u64, text: &str) -> Result<Option<Comment>, NewsError> {
        Ok(self.comments.get_mut(&id).map(|mut entry| {
            entry.text = text.to_string();
            entry.value().clone()
        }))
    }

    async fn delete_comment(&self, id: u64) -> Result<bool, NewsError> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn comment_count(&self) -> Result<usize, NewsError> {
        Ok(self.comments.len())
    }
}

impl Default for InMemoryNewsStore {
    fn default() -> Self {
        Self::new()
    }
}
