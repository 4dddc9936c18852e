use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::session::Session;

/// Maps opaque session tokens to the usernames they authenticate.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    lifetime: Duration,
}

impl SessionManager {
    /// Creates a new `SessionManager` whose sessions live `duration_days`.
    pub fn new(duration_days: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime: Duration::days(duration_days),
        }
    }

    /// Binds a fresh token to `username`.
    pub async fn create(&self, username: &str) -> (Uuid, Session) {
        let token = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            created_at: now,
            expires_at: now
                .checked_add_signed(self.lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.sessions.write().await.insert(token, session.clone());
        tracing::debug!("🔑 Session created for {}", username);

        (token, session)
    }

    /// Looks up a live session. Expired sessions are dropped on sight.
    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        let session = self.sessions.read().await.get(token).cloned()?;

        if session.is_expired_at(Utc::now()) {
            tracing::debug!("⌛ Session expired for {}", session.username);
            self.destroy(token).await;
            return None;
        }

        Some(session)
    }

    /// Removes a session. Unknown tokens are ignored.
    pub async fn destroy(&self, token: &Uuid) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }

    /// Drops every expired session and reports how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn insert_raw(&self, token: Uuid, session: Session) {
        self.sessions.write().await.insert(token, session);
    }
}
