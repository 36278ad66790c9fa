//! Session persistence layer
//!
//! One [`ConversationState`] per session id, dropped after an idle TTL.
//! Currently in-memory; the trait leaves room for an external cache.

use crate::models::ConversationState;
use crate::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Trait for session persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Live state for a session, or `None` when unknown or expired.
    async fn load(&self, session_id: Uuid) -> Result<Option<ConversationState>>;
    async fn save(&self, session_id: Uuid, state: &ConversationState) -> Result<()>;
    /// Drop every expired session; returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize>;
}

struct SessionEntry {
    state: ConversationState,
    last_seen: DateTime<Utc>,
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: chrono::Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1)),
        }
    }

    fn is_expired(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_seen > self.ttl
    }

    /// Store `state` and drop any other session that has gone idle.
    async fn save_at(&self, session_id: Uuid, state: &ConversationState, now: DateTime<Utc>) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry.last_seen, now));
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!("Dropped {} expired sessions", dropped);
        }
        sessions.insert(
            session_id,
            SessionEntry {
                state: state.clone(),
                last_seen: now,
            },
        );
    }

    async fn load_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Option<ConversationState> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&session_id) {
                None => return None,
                Some(entry) if !self.is_expired(entry.last_seen, now) => {
                    return Some(entry.state.clone());
                }
                Some(_) => {}
            }
        }

        debug!("Session {} expired", session_id);
        self.sessions.write().await.remove(&session_id);
        None
    }

    async fn purge_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry.last_seen, now));
        before - sessions.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: Uuid) -> Result<Option<ConversationState>> {
        Ok(self.load_at(session_id, Utc::now()).await)
    }

    async fn save(&self, session_id: Uuid, state: &ConversationState) -> Result<()> {
        self.save_at(session_id, state, Utc::now()).await;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.purge_at(Utc::now()).await)
    }
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Session id for a client-supplied value: parsed if it is a UUID, hashed
/// into a stable one otherwise, freshly generated when absent.
pub fn resolve_session_id(value: Option<&str>) -> Uuid {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)),
        _ => Uuid::new_v4(),
    }
}

/// Load a session's state, starting a fresh conversation when there is none.
pub async fn load_or_new(store: &dyn SessionStore, session_id: Uuid) -> Result<ConversationState> {
    Ok(store.load(session_id).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = InMemorySessionStore::default();
        let id = Uuid::new_v4();
        let mut state = ConversationState::new();
        state.messages.push(ChatMessage::user("hello"));

        assert_ok!(store.save(id, &state).await);
        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.messages, state.messages);
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = InMemorySessionStore::default();
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
        let fresh = load_or_new(&store, Uuid::new_v4()).await.unwrap();
        assert!(fresh.messages.is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        let now = Utc::now();
        store
            .save_at(id, &ConversationState::new(), now - chrono::Duration::seconds(120))
            .await;

        assert!(store.load_at(id, now).await.is_none());
        assert!(store.sessions.read().await.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_sessions() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let now = Utc::now();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        store
            .save_at(stale, &ConversationState::new(), now - chrono::Duration::minutes(5))
            .await;
        store.save_at(live, &ConversationState::new(), now).await;

        assert_eq!(store.purge_at(now).await, 1);
        assert!(store.load_at(live, now).await.is_some());
    }

    #[tokio::test]
    async fn test_save_drops_idle_sessions() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let now = Utc::now();
        for _ in 0..20 {
            store
                .save_at(Uuid::new_v4(), &ConversationState::new(), now - chrono::Duration::minutes(5))
                .await;
        }

        let active = Uuid::new_v4();
        store.save_at(active, &ConversationState::new(), now).await;

        let sessions = store.sessions.read().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&active));
    }

    #[tokio::test]
    async fn test_anonymous_saves_do_not_accumulate() {
        let store = InMemorySessionStore::new(Duration::ZERO);
        for _ in 0..50 {
            let id = resolve_session_id(None);
            assert_ok!(store.save(id, &ConversationState::new()).await);
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert!(store.sessions.read().await.len() <= 1);
    }

    #[test]
    fn test_resolve_session_id() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_session_id(Some(&id.to_string())), id);
        assert_eq!(
            resolve_session_id(Some("browser-cookie-42")),
            resolve_session_id(Some("browser-cookie-42"))
        );
        assert_ne!(resolve_session_id(None), resolve_session_id(None));
        assert_ne!(resolve_session_id(Some("  ")), resolve_session_id(Some("  ")));
    }
}
