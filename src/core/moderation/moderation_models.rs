// Moderation domain models - data structures for the banned-word filter.
//
// These are pure domain types with no transport dependencies.
// The gateway turns a rejection into a form error.

use serde::{Deserialize, Serialize};

/// Banned terms used by the news app out of the box.
pub const DEFAULT_BANNED_WORDS: [&str; 2] = ["редиска", "негодяй"];

/// Warning shown when a comment contains a banned term.
pub const BANNED_WORD_WARNING: &str = "Не ругайтесь!";

/// Form field the filter reports on.
pub const TEXT_FIELD: &str = "text";

/// Verdict of the content validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject { field: String, warning: String },
}

impl Verdict {
    pub fn reject(field: impl Into<String>, warning: impl Into<String>) -> Self {
        Verdict::Reject {
            field: field.into(),
            warning: warning.into(),
        }
    }

    #[cfg(test)]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Configuration for the banned-word filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Terms that must not appear anywhere in submitted text
    pub banned_words: Vec<String>,
    /// Lowercase text and terms before matching
    pub case_insensitive: bool,
    /// Message attached to the rejected field
    pub warning: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            banned_words: DEFAULT_BANNED_WORDS.iter().map(|w| w.to_string()).collect(),
            case_insensitive: false,
            warning: BANNED_WORD_WARNING.to_string(),
        }
    }
}
