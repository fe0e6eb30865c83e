// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// Variables:
// - STORAGE: `sqlite` (default) or `memory`
// - DATA_DIR: folder for SQLite files (default `data`)
// - NOTES_DATABASE_URL / NEWS_DATABASE_URL: override the per-app database
// - BANNED_WORDS: comma separated list, replaces the built-in list
// - BANNED_WORDS_CASE_INSENSITIVE: `true` / `false`
// - NEWS_COUNT_ON_HOME_PAGE: news items on the home page (default 10)
// - LOGIN_URL: where anonymous users are sent (default `/auth/login/`)

use crate::core::moderation::ModerationConfig;
use crate::core::news::NEWS_COUNT_ON_HOME_PAGE;
use thiserror::Error;

pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageKind,
    pub notes_database_url: String,
    pub news_database_url: String,
    pub moderation: ModerationConfig,
    pub news_per_page: usize,
    pub login_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = match lookup("STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("sqlite") => StorageKind::Sqlite,
            Some("memory") => StorageKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "STORAGE",
                    value: other.to_string(),
                    reason: "expected `sqlite` or `memory`".to_string(),
                })
            }
        };

        let data_dir = lookup("DATA_DIR").unwrap_or_else(|| "data".to_string());
        let notes_database_url =
            lookup("NOTES_DATABASE_URL").unwrap_or_else(|| format!("{}/notes.db", data_dir));
        let news_database_url =
            lookup("NEWS_DATABASE_URL").unwrap_or_else(|| format!("{}/news.db", data_dir));

        let mut moderation = ModerationConfig::default();
        if let Some(words) = lookup("BANNED_WORDS") {
            moderation.banned_words = words
                .split(',')
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
        }
        if let Some(raw) = lookup("BANNED_WORDS_CASE_INSENSITIVE") {
            moderation.case_insensitive =
                raw.trim()
                    .parse::<bool>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "BANNED_WORDS_CASE_INSENSITIVE",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }

        let news_per_page = match lookup("NEWS_COUNT_ON_HOME_PAGE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "NEWS_COUNT_ON_HOME_PAGE",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: "NEWS_COUNT_ON_HOME_PAGE",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })
                }
            },
            None => NEWS_COUNT_ON_HOME_PAGE,
        };

        let login_url = lookup("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());

        Ok(Self {
            storage,
            notes_database_url,
            news_database_url,
            moderation,
            news_per_page,
            login_url,
        })
    }
}
