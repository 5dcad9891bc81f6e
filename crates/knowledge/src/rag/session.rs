//! Session store: per-session conversation history.
//!
//! Sessions are created lazily on first use and keyed by a thread key
//! derived from the caller's session id. Each session sits behind its own
//! async mutex, so turns on one session run one at a time while different
//! sessions proceed in parallel.
//!
//! Growth is bounded two ways: a session idle for longer than the TTL is
//! dropped, and when the store is full the least recently used idle
//! sessions are evicted to make room. A session with a turn in flight is
//! never evicted.

use dashmap::DashMap;
use groundwork_core::{AppError, AppResult, RagConfig};
use groundwork_llm::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One conversation thread.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub thread_key: String,
    /// Linear, append-only transcript
    pub history: Vec<Message>,
}

/// Exclusive access to a session for the duration of a turn.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Derive the internal thread key for a session id.
pub fn thread_key(session_id: &str) -> String {
    format!("user_{}", session_id)
}

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_used_ms: AtomicU64,
}

impl SessionEntry {
    fn touch(&self, now_ms: u64) {
        self.last_used_ms.store(now_ms, Ordering::Relaxed);
    }

    fn last_used(&self) -> u64 {
        self.last_used_ms.load(Ordering::Relaxed)
    }

    /// Only the map holds the session, so no turn is using it.
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.session) == 1
    }
}

/// Concurrent map of thread key to session.
pub struct SessionStore {
    sessions: DashMap<String, Arc<SessionEntry>>,
    ttl: Duration,
    max_sessions: usize,
    epoch: Instant,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
            epoch: Instant::now(),
        }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.session_ttl(), config.max_sessions)
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn is_expired(&self, entry: &SessionEntry, now_ms: u64) -> bool {
        entry.is_idle() && now_ms.saturating_sub(entry.last_used()) > self.ttl.as_millis() as u64
    }

    /// Get or create the session and lock it for one turn.
    ///
    /// Waits while another turn on the same session is in flight.
    pub async fn acquire(&self, session_id: &str) -> AppResult<SessionGuard> {
        let key = thread_key(session_id);
        let now = self.now_ms();

        if self
            .sessions
            .remove_if(&key, |_, entry| self.is_expired(entry, now))
            .is_some()
        {
            tracing::debug!(thread = %key, "Session expired, starting a fresh thread");
        }

        let existing = self.sessions.get(&key).map(|entry| {
            entry.touch(now);
            Arc::clone(&entry.session)
        });

        let session = match existing {
            Some(session) => session,
            None => self.create(&key, session_id, now)?,
        };

        Ok(session.lock_owned().await)
    }

    fn create(&self, key: &str, session_id: &str, now: u64) -> AppResult<Arc<Mutex<Session>>> {
        if self.sessions.len() >= self.max_sessions {
            self.evict_expired();
        }
        if self.sessions.len() >= self.max_sessions {
            self.evict_lru(self.sessions.len() + 1 - self.max_sessions);
        }
        if self.sessions.len() >= self.max_sessions {
            return Err(AppError::Session(format!(
                "Session store is full ({} sessions, all busy)",
                self.max_sessions
            )));
        }

        let entry = self
            .sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::debug!(thread = %key, "Creating session");
                Arc::new(SessionEntry {
                    session: Arc::new(Mutex::new(Session {
                        session_id: session_id.to_string(),
                        thread_key: key.to_string(),
                        history: Vec::new(),
                    })),
                    last_used_ms: AtomicU64::new(now),
                })
            });
        entry.touch(now);
        Ok(Arc::clone(&entry.session))
    }

    /// Drop idle sessions past the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.now_ms();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let expired = self.is_expired(entry, now);
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            tracing::info!(removed, "Evicted expired sessions");
        }
        removed
    }

    /// Drop up to `count` idle sessions, least recently used first.
    fn evict_lru(&self, count: usize) -> usize {
        let mut idle: Vec<(String, u64)> = self
            .sessions
            .iter()
            .filter(|r| r.value().is_idle())
            .map(|r| (r.key().clone(), r.value().last_used()))
            .collect();
        idle.sort_by_key(|(_, last_used)| *last_used);

        let mut removed = 0;
        for (key, _) in idle {
            if removed >= count {
                break;
            }
            if self
                .sessions
                .remove_if(&key, |_, entry| entry.is_idle())
                .is_some()
            {
                tracing::debug!(thread = %key, "Evicted least recently used session");
                removed += 1;
            }
        }
        removed
    }

    /// Forget a session. Returns false if it did not exist.
    ///
    /// Waits for an in-flight turn to finish, then clears its history. The
    /// entry itself is dropped only if no other turn has queued on it in the
    /// meantime, so a session id never maps to two live sessions at once.
    pub async fn remove(&self, session_id: &str) -> bool {
        let key = thread_key(session_id);
        let Some(session) = self
            .sessions
            .get(&key)
            .map(|entry| Arc::clone(&entry.session))
        else {
            return false;
        };

        session.lock().await.history.clear();
        drop(session);

        if self
            .sessions
            .remove_if(&key, |_, entry| entry.is_idle())
            .is_none()
        {
            tracing::debug!(thread = %key, "Session in use, kept with cleared history");
        }
        true
    }

    /// Snapshot of a session's history; empty if the session does not exist.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let session = self
            .sessions
            .get(&thread_key(session_id))
            .map(|entry| Arc::clone(&entry.session));
        match session {
            Some(session) => session.lock().await.history.clone(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(&thread_key(session_id))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
