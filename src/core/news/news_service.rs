// News service - public feed plus moderated comments.
//
// This service handles:
// - Home feed (latest N items) and news detail
// - Comment create / edit / delete gated by the access controller
// - Banned-word moderation of comment text
//
// NO transport dependencies here - just pure domain logic.

use super::news_models::{Comment, CommentForm, NewComment, NewNews, News, NewsDetail};
use crate::core::access::{
    decide, decide_for, Action, Actor, Decision, FormErrors, Outcome, REQUIRED_WARNING,
};
use crate::core::moderation::{ContentFilter, Verdict, TEXT_FIELD};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn insert_news(&self, news: NewNews) -> Result<News, NewsError>;

    async fn get_news(&self, id: u64) -> Result<Option<News>, NewsError>;

    /// Newest first (by date, then by id).
    async fn latest_news(&self, limit: usize) -> Result<Vec<News>, NewsError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, NewsError>;

    async fn get_comment(&self, id: u64) -> Result<Option<Comment>, NewsError>;

    /// Comments of one news item, oldest first.
    async fn comments_for(&self, news_id: u64) -> Result<Vec<Comment>, NewsError>;

    /// Replace the text of a comment. Returns `None` if it no longer exists.
    async fn update_comment_text(&self, id: u64, text: &str) -> Result<Option<Comment>, NewsError>;

    /// Remove a comment. Returns false if it was already gone.
    async fn delete_comment(&self, id: u64) -> Result<bool, NewsError>;

    async fn comment_count(&self) -> Result<usize, NewsError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct NewsService<S: NewsStore> {
    store: S,
    filter: ContentFilter,
    per_page: usize,
}

impl<S: NewsStore> NewsService<S> {
    pub fn new(store: S, filter: ContentFilter, per_page: usize) -> Self {
        Self {
            store,
            filter,
            per_page,
        }
    }

    /// Latest news for the public home page.
    pub async fn home(&self) -> Result<Vec<News>, NewsError> {
        self.store.latest_news(self.per_page).await
    }

    /// Public news page with comments, oldest first.
    pub async fn detail(&self, news_id: u64) -> Result<Outcome<NewsDetail>, NewsError> {
        let Some(news) = self.store.get_news(news_id).await? else {
            return Ok(Outcome::NotFound);
        };
        let comments = self.store.comments_for(news_id).await?;
        Ok(Outcome::Done(NewsDetail { news, comments }))
    }

    /// Publish a news item. Operator action, no actor involved.
    pub async fn publish(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        date: NaiveDate,
    ) -> Result<News, NewsError> {
        let news = self
            .store
            .insert_news(NewNews {
                title: title.into(),
                text: text.into(),
                date,
            })
            .await?;
        tracing::info!(news_id = news.id, date = %news.date, "News published");
        Ok(news)
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        news_id: u64,
        form: &CommentForm,
    ) -> Result<Outcome<Comment>, NewsError> {
        if let Some(denied) = Outcome::from_denial(decide(Action::Create, actor, None)) {
            return Ok(denied);
        }
        let Some(author) = actor.user_key() else {
            return Ok(Outcome::LoginRequired);
        };

        if self.store.get_news(news_id).await?.is_none() {
            return Ok(Outcome::NotFound);
        }

        let text = match self.clean(form) {
            Ok(text) => text,
            Err(errors) => {
                tracing::warn!(author = %author, news_id, "Comment rejected");
                return Ok(Outcome::Rejected(errors));
            }
        };

        let comment = self
            .store
            .insert_comment(NewComment {
                news_id,
                author,
                text,
                created: Utc::now(),
            })
            .await?;

        tracing::info!(author = %author, news_id, comment_id = comment.id, "Comment added");
        Ok(Outcome::Done(comment))
    }

    /// Comment shown on the edit page.
    pub async fn comment_for_edit(
        &self,
        actor: &Actor,
        comment_id: u64,
    ) -> Result<Outcome<Comment>, NewsError> {
        self.load_owned(Action::Edit, actor, comment_id).await
    }

    /// Comment shown on the delete confirmation page.
    pub async fn comment_for_delete(
        &self,
        actor: &Actor,
        comment_id: u64,
    ) -> Result<Outcome<Comment>, NewsError> {
        self.load_owned(Action::Delete, actor, comment_id).await
    }

    pub async fn edit_comment(
        &self,
        actor: &Actor,
        comment_id: u64,
        form: &CommentForm,
    ) -> Result<Outcome<Comment>, NewsError> {
        let current = match self.load_owned(Action::Edit, actor, comment_id).await? {
            Outcome::Done(comment) => comment,
            other => return Ok(other),
        };

        let text = match self.clean(form) {
            Ok(text) => text,
            Err(errors) => {
                tracing::warn!(comment_id, "Comment edit rejected");
                return Ok(Outcome::Rejected(errors));
            }
        };

        match self.store.update_comment_text(current.id, &text).await? {
            Some(comment) => {
                tracing::info!(author = %comment.author, comment_id, "Comment edited");
                Ok(Outcome::Done(comment))
            }
            None => Ok(Outcome::NotFound),
        }
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        comment_id: u64,
    ) -> Result<Outcome<Comment>, NewsError> {
        let comment = match self.load_owned(Action::Delete, actor, comment_id).await? {
            Outcome::Done(comment) => comment,
            other => return Ok(other),
        };

        if !self.store.delete_comment(comment.id).await? {
            return Ok(Outcome::NotFound);
        }

        tracing::info!(author = %comment.author, comment_id, "Comment deleted");
        Ok(Outcome::Done(comment))
    }

    pub async fn comment_count(&self) -> Result<usize, NewsError> {
        self.store.comment_count().await
    }

    async fn load_owned(
        &self,
        action: Action,
        actor: &Actor,
        comment_id: u64,
    ) -> Result<Outcome<Comment>, NewsError> {
        if decide(action, actor, None) == Decision::DenyRedirectLogin {
            return Ok(Outcome::LoginRequired);
        }

        let comment = self.store.get_comment(comment_id).await?;
        match Outcome::from_denial(decide_for(action, actor, comment.as_ref())) {
            Some(denied) => {
                tracing::debug!(%action, comment_id, "Comment access denied");
                Ok(denied)
            }
            None => Ok(comment.map(Outcome::Done).unwrap_or(Outcome::NotFound)),
        }
    }

    /// Required-field check, then the banned-word filter.
    fn clean(&self, form: &CommentForm) -> Result<String, FormErrors> {
        let text = form.text.trim();
        if text.is_empty() {
            return Err(FormErrors::single(TEXT_FIELD, REQUIRED_WARNING));
        }

        match self.filter.validate(text) {
            Verdict::Accept => Ok(text.to_string()),
            Verdict::Reject { field, warning } => Err(FormErrors::single(field, warning)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
