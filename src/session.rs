//! The single authoritative session module.
//!
//! Exactly one credential strategy exists: a bearer token pair stored in the
//! cookie-backed session under `access_token` / `refresh_token`. The
//! resolved user is cached per session behind a generation guard so a slow
//! `auth/me` response can never overwrite state written by a newer login or
//! logout.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reqwest::StatusCode;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::clients::{AuthClient, ClientError};
use crate::fetch::{CancelToken, Latest};
use crate::models::{SessionTokens, User};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// What the rest of the tree sees: the operator if one is signed in, and a
/// lookup error when resolution failed for reasons other than "no session".
/// Consumers can tell "not authenticated" apart from "lookup failed".
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub user: Option<User>,
    pub error: Option<String>,
}

impl CurrentUser {
    fn anonymous() -> Self {
        Self::default()
    }

    fn known(user: User) -> Self {
        Self {
            user: Some(user),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            user: None,
            error: Some(error.into()),
        }
    }
}

/// Sessions that expire without an explicit logout leave no eviction hook,
/// so the slot map is capped; crossing the cap drops every slot, which only
/// costs each live session one extra `auth/me` lookup.
const MAX_CACHE_SLOTS: usize = 1024;

/// Per-session cache of the resolved user, keyed by session id. Each slot
/// is a [`Latest`] so commits from superseded lookups are rejected.
#[derive(Debug, Default)]
pub struct UserCache {
    slots: RwLock<HashMap<String, Arc<Latest<User>>>>,
}

impl UserCache {
    fn slot(&self, key: &str) -> Arc<Latest<User>> {
        if let Some(slot) = self.slots.read().expect("user cache poisoned").get(key) {
            return slot.clone();
        }

        let mut slots = self.slots.write().expect("user cache poisoned");
        if slots.len() >= MAX_CACHE_SLOTS && !slots.contains_key(key) {
            slots.clear();
        }
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Remove the slot entirely, invalidating it so a lookup already in
    /// flight against the old slot cannot commit either.
    fn invalidate_key(&self, key: &str) {
        let removed = self.slots.write().expect("user cache poisoned").remove(key);
        if let Some(slot) = removed {
            slot.invalidate();
        }
    }

    pub fn invalidate(&self, session: &Session) {
        if let Some(id) = session.id() {
            self.invalidate_key(&id.to_string());
        }
    }
}

pub async fn access_token(
    session: &Session,
) -> Result<Option<String>, tower_sessions::session::Error> {
    let token: Option<String> = session.get(ACCESS_TOKEN_KEY).await?;
    Ok(token.filter(|t| !t.is_empty()))
}

/// Store a fresh token pair, dropping any cached user from an earlier
/// sign-in on this session.
pub async fn store_tokens(
    session: &Session,
    tokens: &SessionTokens,
    cache: &UserCache,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(ACCESS_TOKEN_KEY, &tokens.access_token).await?;
    session
        .insert(REFRESH_TOKEN_KEY, &tokens.refresh_token)
        .await?;
    cache.invalidate(session);
    Ok(())
}

/// Remove both tokens. Callers only do this after the upstream sign-out
/// succeeded; on failure the pair stays exactly as it was.
pub async fn clear_tokens(
    session: &Session,
    cache: &UserCache,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(ACCESS_TOKEN_KEY).await?;
    session.remove::<String>(REFRESH_TOKEN_KEY).await?;
    cache.invalidate(session);
    Ok(())
}

/// Resolve the current operator.
///
/// No token in the session short-circuits without a network call. A cached
/// user is returned as-is; otherwise `auth/me` is fetched once and committed
/// behind the session's generation guard.
pub async fn current_user(
    session: &Session,
    auth: &AuthClient,
    cache: &UserCache,
    cancel: &CancelToken,
) -> CurrentUser {
    let token = match access_token(session).await {
        Ok(Some(token)) => token,
        Ok(None) => return CurrentUser::anonymous(),
        Err(e) => {
            warn!("Failed to read session: {e}");
            return CurrentUser::failed(format!("session error: {e}"));
        }
    };

    // A session without an id has never been persisted; nothing to cache
    // against, so resolve directly.
    let Some(id) = session.id() else {
        let resolved = resolve(auth, &token, cancel).await;
        drop_rejected_tokens(session, cache, &resolved).await;
        return resolved;
    };

    let slot = cache.slot(&id.to_string());
    if let Some(user) = slot.get() {
        return CurrentUser::known(user);
    }

    let ticket = slot.begin();
    let resolved = resolve(auth, &token, cancel).await;

    if let Some(user) = &resolved.user
        && !slot.commit(ticket, user.clone())
    {
        // A login or logout raced this lookup; the fresher state wins and
        // this result serves only the request that asked for it.
        debug!("Discarding superseded user lookup for session {id}");
    }

    drop_rejected_tokens(session, cache, &resolved).await;
    resolved
}

/// A token the upstream rejected stays rejected; keeping the pair around
/// would bounce the operator between the login redirect and the
/// token-presence check on the login page forever.
async fn drop_rejected_tokens(session: &Session, cache: &UserCache, resolved: &CurrentUser) {
    // Anonymous after a resolve means the token itself was refused; the
    // no-token case never reaches the network.
    if resolved.user.is_none() && resolved.error.is_none() {
        if let Err(e) = clear_tokens(session, cache).await {
            warn!("Failed to drop rejected session tokens: {e}");
        }
    }
}

async fn resolve(auth: &AuthClient, token: &str, cancel: &CancelToken) -> CurrentUser {
    match auth.current_user(token, cancel).await {
        Ok(user) => CurrentUser::known(user),
        Err(ClientError::Status { status, .. })
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
        {
            debug!("Access token rejected upstream ({status})");
            CurrentUser::anonymous()
        }
        Err(e) => {
            warn!("Failed to fetch current user: {e}");
            CurrentUser::failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: "admin".to_string(),
            status: None,
        }
    }

    #[test]
    fn test_cache_slot_is_stable_per_key() {
        let cache = UserCache::default();
        let slot = cache.slot("session-a");
        let ticket = slot.begin();
        assert!(slot.commit(ticket, test_user()));

        assert!(cache.slot("session-a").get().is_some());
        assert!(cache.slot("session-b").get().is_none());
    }

    #[test]
    fn test_invalidate_rejects_in_flight_commit() {
        let cache = UserCache::default();
        let slot = cache.slot("session-a");

        let ticket = slot.begin();
        cache.invalidate_key("session-a");

        // The lookup that started before the invalidation must not repopulate
        // the cache.
        assert!(!slot.commit(ticket, test_user()));
        assert!(cache.slot("session-a").get().is_none());
    }

    #[test]
    fn test_invalidate_removes_the_slot_entry() {
        let cache = UserCache::default();
        let slot = cache.slot("session-a");
        let ticket = slot.begin();
        assert!(slot.commit(ticket, test_user()));
        assert_eq!(cache.slots.read().unwrap().len(), 1);

        cache.invalidate_key("session-a");
        assert!(cache.slots.read().unwrap().is_empty());
    }

    #[test]
    fn test_slot_map_is_bounded() {
        let cache = UserCache::default();
        for i in 0..MAX_CACHE_SLOTS {
            cache.slot(&format!("session-{i}"));
        }
        assert_eq!(cache.slots.read().unwrap().len(), MAX_CACHE_SLOTS);

        // One more distinct key crosses the cap and flushes the map.
        cache.slot("session-overflow");
        assert_eq!(cache.slots.read().unwrap().len(), 1);

        // A key already present never triggers a flush.
        cache.slot("session-overflow");
        assert_eq!(cache.slots.read().unwrap().len(), 1);
    }
}
