// Access controller - decides who may see or touch a resource.
//
// Everything here is a pure function. Services call `decide` before they
// touch a store, and the gateway turns the answer into a status.
//
// Policy notes:
// - Anonymous actors are sent to the login page for anything but browsing.
// - An authenticated non-owner gets NotFound, never a distinct "forbidden",
//   so other users' resources cannot be probed.

use super::access_models::{Action, Actor, Decision, UserKey};

/// Anything that has exactly one owner.
pub trait Owned {
    fn owner(&self) -> UserKey;
}

/// Decide whether `actor` may perform `action`.
///
/// `owner` is the owner of the targeted resource, or `None` when the resource
/// does not exist (or the action does not target a single resource).
pub fn decide(action: Action, actor: &Actor, owner: Option<UserKey>) -> Decision {
    if action.requires_login() && matches!(actor, Actor::Anonymous) {
        return Decision::DenyRedirectLogin;
    }

    if !action.requires_ownership() {
        return Decision::Allow;
    }

    match owner {
        Some(owner) if actor.owns(owner) => Decision::Allow,
        _ => Decision::DenyNotFound,
    }
}

/// Shorthand for resource-targeting actions: looks up the owner on the
/// (possibly missing) resource and decides.
pub fn decide_for<R: Owned>(action: Action, actor: &Actor, resource: Option<&R>) -> Decision {
    decide(action, actor, resource.map(Owned::owner))
}

/// Keep only resources owned by `actor`. Anonymous actors get nothing.
pub fn scope_to_owner<R: Owned>(actor: &Actor, resources: Vec<R>) -> Vec<R> {
    resources
        .into_iter()
        .filter(|r| actor.owns(r.owner()))
        .collect()
}

/// Login redirect target carrying the originally requested path.
pub fn login_redirect(login_url: &str, requested_path: &str) -> String {
    format!("{}?next={}", login_url, requested_path)
}

// ============================================================================
// TESTS
// ============================================================================
