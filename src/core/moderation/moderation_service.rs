// Content filter - core business logic for comment moderation.
//
// Matching is plain substring containment, not word tokenizing: a banned
// term glued to other text still counts.
//
// NO transport dependencies here - just pure domain logic.

use super::moderation_models::{ModerationConfig, Verdict, TEXT_FIELD};

/// Banned-word filter for user submitted text.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    config: ModerationConfig,
    /// Terms prepared once for matching (lowercased when case-insensitive)
    terms: Vec<String>,
}

impl ContentFilter {
    pub fn new(config: ModerationConfig) -> Self {
        let terms = config
            .banned_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(|w| {
                if config.case_insensitive {
                    w.to_lowercase()
                } else {
                    w.to_string()
                }
            })
            .collect();

        Self { config, terms }
    }

    /// Check text against the banned terms.
    pub fn validate(&self, text: &str) -> Verdict {
        match self.find_banned(text) {
            Some(term) => {
                tracing::debug!(term = %term, "Banned term found in submitted text");
                Verdict::reject(TEXT_FIELD, self.config.warning.clone())
            }
            None => Verdict::Accept,
        }
    }

    /// First banned term contained in `text`, if any.
    pub fn find_banned(&self, text: &str) -> Option<&str> {
        let lowered;
        let haystack = if self.config.case_insensitive {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        self.terms
            .iter()
            .find(|term| haystack.contains(term.as_str()))
            .map(|term| term.as_str())
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(ModerationConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
