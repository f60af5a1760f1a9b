//! In-memory session-to-user binding store
//!
//! Owns two tables behind a single lock: session bindings and per-user
//! credentials. Every credential read goes through
//! [`SessionStore::get_validated_token`], which only hands out a token to a
//! session bound to that exact user.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::session::{BindOutcome, Binding, CredentialRecord, SlackToken};

#[derive(Debug, Default)]
struct Tables {
    /// session_id -> binding
    bindings: HashMap<String, Binding>,
    /// user_id -> credential
    credentials: HashMap<String, CredentialRecord>,
}

/// Session binding store
#[derive(Debug, Default)]
pub struct SessionStore {
    tables: RwLock<Tables>,
    /// Maximum binding age. `None` keeps bindings for the process lifetime.
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Create a store whose bindings never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose bindings expire `ttl` after they were created
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            ttl,
        }
    }

    // Writers only insert or remove whole entries, so a poisoned lock still
    // guards consistent tables.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, binding: &Binding, now: DateTime<Utc>) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => binding
                .bound_at
                .checked_add_signed(ttl)
                .is_none_or(|deadline| now < deadline),
        }
    }

    /// Record `credential` for `user_id` and bind `session_id` to that user.
    ///
    /// * unbound session: creates the binding
    /// * session bound to the same user: refreshes the credential only
    /// * session bound to another user: [`SessionError::BindingConflict`], nothing changes
    ///
    /// Without a session id the credential is stored and no binding is made.
    pub fn bind_and_store(
        &self,
        user_id: &str,
        credential: impl Into<CredentialRecord>,
        session_id: Option<&str>,
    ) -> Result<BindOutcome, SessionError> {
        if user_id.is_empty() {
            return Err(SessionError::EmptyUserId);
        }
        let credential = credential.into();
        let session_id = session_id.filter(|s| !s.is_empty());
        let now = Utc::now();

        let mut tables = self.write();

        let outcome = match session_id {
            None => BindOutcome::Unbound,
            Some(sid) => {
                let current = tables
                    .bindings
                    .get(sid)
                    .filter(|b| self.is_live(b, now))
                    .map(|b| b.user_id.clone());

                match current {
                    Some(bound) if bound == user_id => BindOutcome::Refreshed,
                    Some(_) => {
                        warn!(session_id = %sid, "Rejected bind: session already claimed by a different user");
                        return Err(SessionError::BindingConflict {
                            session_id: sid.to_string(),
                        });
                    }
                    None => {
                        tables.bindings.insert(
                            sid.to_string(),
                            Binding {
                                user_id: user_id.to_string(),
                                bound_at: now,
                            },
                        );
                        BindOutcome::Bound
                    }
                }
            }
        };

        tables.credentials.insert(user_id.to_string(), credential);

        match outcome {
            BindOutcome::Bound => info!(session_id = ?session_id, user_id = %user_id, "Session bound"),
            BindOutcome::Refreshed => debug!(session_id = ?session_id, user_id = %user_id, "Credential refreshed"),
            BindOutcome::Unbound => debug!(user_id = %user_id, "Credential stored without session binding"),
        }

        Ok(outcome)
    }

    /// User bound to `session_id`, if any.
    ///
    /// For logging and telemetry only. Never use it to authorize a read.
    pub fn lookup_user_for_session(&self, session_id: &str) -> Option<String> {
        if session_id.is_empty() {
            return None;
        }
        let tables = self.read();
        tables
            .bindings
            .get(session_id)
            .filter(|b| self.is_live(b, Utc::now()))
            .map(|b| b.user_id.clone())
    }

    /// Token of `requested_user_id`, only if `session_id` is bound to that user.
    ///
    /// Missing, unknown and cross-user sessions all produce `None`.
    pub fn get_validated_token(
        &self,
        requested_user_id: &str,
        session_id: Option<&str>,
    ) -> Option<SlackToken> {
        self.get_validated_credential(requested_user_id, session_id)
            .map(|record| record.token)
    }

    /// Same gate as [`get_validated_token`](Self::get_validated_token) but
    /// returns the whole credential record.
    pub fn get_validated_credential(
        &self,
        requested_user_id: &str,
        session_id: Option<&str>,
    ) -> Option<CredentialRecord> {
        let record = session_id
            .filter(|s| !s.is_empty())
            .and_then(|sid| {
                let tables = self.read();
                let binding = tables.bindings.get(sid)?;
                if binding.user_id != requested_user_id || !self.is_live(binding, Utc::now()) {
                    return None;
                }
                tables.credentials.get(requested_user_id).cloned()
            });

        if record.is_none() {
            debug!("Validated credential read denied");
        }
        record
    }

    /// Drop one session binding. The user's credential goes too when no
    /// other session still references it.
    pub fn evict_session(&self, session_id: &str) -> bool {
        let mut tables = self.write();
        let Some(binding) = tables.bindings.remove(session_id) else {
            return false;
        };

        let still_referenced = tables
            .bindings
            .values()
            .any(|b| b.user_id == binding.user_id);
        if !still_referenced {
            tables.credentials.remove(&binding.user_id);
        }

        info!(session_id = %session_id, "Session evicted");
        true
    }

    /// Remove expired bindings and credentials no binding references.
    /// Returns the number of bindings removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub(crate) fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut tables = self.write();

        let before = tables.bindings.len();
        tables.bindings.retain(|_, b| self.is_live(b, now));
        let removed = before - tables.bindings.len();

        let referenced: HashSet<String> = tables
            .bindings
            .values()
            .map(|b| b.user_id.clone())
            .collect();
        tables.credentials.retain(|user_id, _| referenced.contains(user_id));

        if removed > 0 {
            info!("Swept {} expired session bindings", removed);
        }
        removed
    }

    /// Start a background task that sweeps expired bindings every `every`
    pub fn start_sweeper(self: Arc<Self>, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                self.sweep_expired();
            }
        })
    }

    /// Number of live session bindings
    pub fn session_count(&self) -> usize {
        let now = Utc::now();
        self.read()
            .bindings
            .values()
            .filter(|b| self.is_live(b, now))
            .count()
    }

    /// Number of stored credential records
    pub fn user_count(&self) -> usize {
        self.read().credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn token(store: &SessionStore, user: &str, session: Option<&str>) -> Option<String> {
        store
            .get_validated_token(user, session)
            .map(|t| t.expose().to_string())
    }

    #[test]
    fn test_immutable_session_binding() {
        let store = SessionStore::new();

        let outcome = store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();
        assert_eq!(outcome, BindOutcome::Bound);
        assert_eq!(store.lookup_user_for_session("session_1").as_deref(), Some("user_a"));

        let err = store
            .bind_and_store("user_b", "token_b", Some("session_1"))
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("already bound to a different user"));

        assert_eq!(store.lookup_user_for_session("session_1").as_deref(), Some("user_a"));
        // The rejected call must not have stored user_b's credential either
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_cross_user_access_prevention() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();
        store.bind_and_store("user_b", "token_b", Some("session_2")).unwrap();

        assert_eq!(token(&store, "user_b", Some("session_1")), None);
        assert_eq!(token(&store, "user_a", Some("session_2")), None);

        assert_eq!(token(&store, "user_a", Some("session_1")).as_deref(), Some("token_a"));
        assert_eq!(token(&store, "user_b", Some("session_2")).as_deref(), Some("token_b"));
    }

    #[test]
    fn test_no_session_denied() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();

        assert_eq!(token(&store, "user_a", None), None);
        assert_eq!(token(&store, "user_a", Some("")), None);
    }

    #[test]
    fn test_unbound_session_denied() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();

        assert_eq!(token(&store, "user_a", Some("session_999")), None);
        assert_eq!(store.lookup_user_for_session("session_999"), None);
    }

    #[test]
    fn test_refresh_preserves_binding() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();

        let outcome = store
            .bind_and_store("user_a", "new_token_a", Some("session_1"))
            .unwrap();
        assert_eq!(outcome, BindOutcome::Refreshed);

        assert_eq!(store.lookup_user_for_session("session_1").as_deref(), Some("user_a"));
        assert_eq!(token(&store, "user_a", Some("session_1")).as_deref(), Some("new_token_a"));
    }

    #[test]
    fn test_multiple_sessions_same_user() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("session_1")).unwrap();
        store.bind_and_store("user_a", "token_a", Some("session_2")).unwrap();

        assert_eq!(token(&store, "user_a", Some("session_1")).as_deref(), Some("token_a"));
        assert_eq!(token(&store, "user_a", Some("session_2")).as_deref(), Some("token_a"));
        assert_eq!(store.session_count(), 2);
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_alice_bob_mallory() {
        let store = SessionStore::new();
        store.bind_and_store("alice", "tok-A", Some("s1")).unwrap();
        store.bind_and_store("bob", "tok-B", Some("s2")).unwrap();

        assert_eq!(token(&store, "bob", Some("s1")), None);
        assert_eq!(token(&store, "alice", Some("s1")).as_deref(), Some("tok-A"));

        let err = store.bind_and_store("mallory", "tok-M", Some("s1")).unwrap_err();
        assert_eq!(
            err,
            SessionError::BindingConflict {
                session_id: "s1".to_string()
            }
        );
        assert_eq!(store.lookup_user_for_session("s1").as_deref(), Some("alice"));
        assert_eq!(token(&store, "mallory", Some("s1")), None);
    }

    #[test]
    fn test_credential_without_session_is_unreachable() {
        let store = SessionStore::new();
        let outcome = store.bind_and_store("user_a", "token_a", None).unwrap();
        assert_eq!(outcome, BindOutcome::Unbound);
        assert_eq!(store.session_count(), 0);
        assert_eq!(store.user_count(), 1);
        assert_eq!(token(&store, "user_a", None), None);

        // Empty session ids behave like missing ones
        let outcome = store.bind_and_store("user_a", "token_a", Some("")).unwrap();
        assert_eq!(outcome, BindOutcome::Unbound);
    }

    #[test]
    fn test_empty_user_rejected() {
        let store = SessionStore::new();
        let err = store.bind_and_store("", "token", Some("s1")).unwrap_err();
        assert_eq!(err, SessionError::EmptyUserId);
        assert_eq!(store.lookup_user_for_session("s1"), None);
    }

    #[test]
    fn test_refresh_via_other_session_updates_shared_credential() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "old", Some("s1")).unwrap();
        store.bind_and_store("user_a", "new", Some("s2")).unwrap();

        // One credential record per user, shared by both sessions
        assert_eq!(token(&store, "user_a", Some("s1")).as_deref(), Some("new"));
        assert_eq!(token(&store, "user_a", Some("s2")).as_deref(), Some("new"));
    }

    #[test]
    fn test_evict_session() {
        let store = SessionStore::new();
        store.bind_and_store("user_a", "token_a", Some("s1")).unwrap();
        store.bind_and_store("user_a", "token_a", Some("s2")).unwrap();

        assert!(store.evict_session("s1"));
        assert!(!store.evict_session("s1"));
        assert_eq!(token(&store, "user_a", Some("s1")), None);
        // Other session of the same user is untouched
        assert_eq!(token(&store, "user_a", Some("s2")).as_deref(), Some("token_a"));
        assert_eq!(store.user_count(), 1);

        assert!(store.evict_session("s2"));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_expired_binding_is_denied_and_swept() {
        let store = SessionStore::with_ttl(Some(Duration::minutes(30)));
        store.bind_and_store("user_a", "token_a", Some("s1")).unwrap();
        assert_eq!(token(&store, "user_a", Some("s1")).as_deref(), Some("token_a"));

        // Nothing to sweep yet
        assert_eq!(store.sweep_expired(), 0);

        let later = Utc::now() + Duration::hours(1);
        assert_eq!(store.sweep_expired_at(later), 1);
        assert_eq!(store.session_count(), 0);
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_zero_ttl_fails_closed() {
        let store = SessionStore::with_ttl(Some(Duration::zero()));
        store.bind_and_store("user_a", "token_a", Some("s1")).unwrap();

        assert_eq!(token(&store, "user_a", Some("s1")), None);
        assert_eq!(store.lookup_user_for_session("s1"), None);

        // An expired binding no longer claims the session
        let outcome = store.bind_and_store("user_b", "token_b", Some("s1")).unwrap();
        assert_eq!(outcome, BindOutcome::Bound);
    }

    #[test]
    fn test_concurrent_first_binds_have_one_winner() {
        const CONTENDERS: usize = 8;

        for round in 0..20 {
            let store = Arc::new(SessionStore::new());
            let barrier = Arc::new(Barrier::new(CONTENDERS));
            let session = format!("session-{}", round);

            let handles: Vec<_> = (0..CONTENDERS)
                .map(|i| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    let session = session.clone();
                    thread::spawn(move || {
                        let user = format!("user-{}", i);
                        barrier.wait();
                        store
                            .bind_and_store(&user, format!("token-{}", i), Some(&session))
                            .map(|_| user)
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winners: Vec<&String> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            let conflicts = results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .filter(|e| e.is_conflict())
                .count();

            assert_eq!(winners.len(), 1);
            assert_eq!(conflicts, CONTENDERS - 1);

            let winner = winners[0];
            assert_eq!(store.lookup_user_for_session(&session).as_ref(), Some(winner));
            let expected = format!("token-{}", winner.trim_start_matches("user-"));
            assert_eq!(token(&store, winner, Some(&session)), Some(expected));
            assert_eq!(store.user_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_sweeper_task_runs() {
        let store = Arc::new(SessionStore::with_ttl(Some(Duration::zero())));
        store.bind_and_store("user_a", "token_a", Some("s1")).unwrap();

        let handle = Arc::clone(&store).start_sweeper(std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(store.user_count(), 0);
    }
}
