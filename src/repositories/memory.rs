use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::user::{NewUser, User};
use crate::repositories::user::{StoreError, StoreResult, UniqueField, UserStore};

#[derive(Default)]
struct Inner {
    by_username: HashMap<String, User>,
    username_by_email: HashMap<String, String>,
    last_id: i64,
}

/// An in-process user store. Records live as long as the process.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_username.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn requires_email(&self) -> bool {
        false
    }

    async fn fetch_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.by_username.get(username).cloned())
    }

    async fn fetch_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .username_by_email
            .get(email)
            .and_then(|username| inner.by_username.get(username))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if inner.by_username.contains_key(&new_user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if let Some(email) = &new_user.email {
            if inner.username_by_email.contains_key(email) {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
        }

        inner.last_id += 1;
        let user = User {
            id: inner.last_id,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            role: new_user.role,
            created_at: Utc::now(),
        };

        if let Some(email) = &user.email {
            inner
                .username_by_email
                .insert(email.clone(), user.username.clone());
        }
        tracing::debug!("🗂️ Stored user {} (id {}) in memory", user.username, user.id);
        inner.by_username.insert(user.username.clone(), user);

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
