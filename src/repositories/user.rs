use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{NewUser, User};

/// A user field that must be unique across records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

/// Failures raised by a user store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the query.
    #[error("user store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// An insert collided with an existing record.
    #[error("duplicate {0}")]
    Duplicate(UniqueField),
}

/// A `Result` type for user store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Holds user records. Both backends satisfy the same contract.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Whether registration must supply an email address.
    fn requires_email(&self) -> bool;

    /// Exact-match lookup by username.
    async fn fetch_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Exact-match lookup by email.
    async fn fetch_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a new record, rejecting a taken username or email.
    async fn create(&self, new_user: NewUser) -> StoreResult<()>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
