// Access domain models - who is asking, what they want, and what we answer.
//
// These are pure domain types with no transport dependencies.
// The gateway layer converts them to redirects and status codes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identity key handed to us by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(pub u64);

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity context of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated(UserKey),
}

impl Actor {
    /// Build an actor from an optional user id (`None` = anonymous).
    pub fn from_user(user: Option<u64>) -> Self {
        match user {
            Some(id) => Actor::Authenticated(UserKey(id)),
            None => Actor::Anonymous,
        }
    }

    pub fn user_key(&self) -> Option<UserKey> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(key) => Some(*key),
        }
    }

    /// True when this actor is the given owner. Anonymous never owns anything.
    pub fn owns(&self, owner: UserKey) -> bool {
        self.user_key() == Some(owner)
    }
}

/// What the actor is trying to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Public pages: home feeds, news detail, auth pages.
    Browse,
    List,
    Create,
    /// Detail view of an owned resource.
    Detail,
    Edit,
    Delete,
}

impl Action {
    pub fn requires_login(&self) -> bool {
        !matches!(self, Action::Browse)
    }

    /// Actions that only the owner of an existing resource may perform.
    pub fn requires_ownership(&self) -> bool {
        matches!(self, Action::Detail | Action::Edit | Action::Delete)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Browse => write!(f, "browse"),
            Action::List => write!(f, "list"),
            Action::Create => write!(f, "create"),
            Action::Detail => write!(f, "detail"),
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Answer of the access controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Ownership mismatch or missing resource. Both look the same to the caller.
    DenyNotFound,
    DenyRedirectLogin,
}

/// Message for a blank required form field.
pub const REQUIRED_WARNING: &str = "Обязательное поле.";

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a single error on a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field (empty slice if none).
    #[cfg(test)]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Result of a service operation once access control and validation ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    NotFound,
    LoginRequired,
    Rejected(FormErrors),
}

impl<T> Outcome<T> {
    /// Map a denial decision to the matching outcome.
    /// Returns `None` for `Decision::Allow` so the caller can carry on.
    pub fn from_denial(decision: Decision) -> Option<Self> {
        match decision {
            Decision::Allow => None,
            Decision::DenyNotFound => Some(Outcome::NotFound),
            Decision::DenyRedirectLogin => Some(Outcome::LoginRequired),
        }
    }

    #[cfg(test)]
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }
}
