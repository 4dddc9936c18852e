use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// The role given to every self-registered account.
pub const DEFAULT_ROLE: &str = "user";

/// Represents a user in the system.
#[derive(FromRow, Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// The store-assigned identifier.
    pub id: i64,
    /// The login name. Unique across all records.
    pub username: String,
    /// The user's email address. Unique where present.
    pub email: Option<String>,
    /// The user's password, stored as given.
    pub password: String,
    /// The user's role.
    pub role: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

/// The fields a caller supplies when registering a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub role: String,
}

impl NewUser {
    /// A new account with the default role.
    pub fn new(username: String, email: Option<String>, password: String) -> Self {
        Self {
            username,
            email,
            password,
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// The public view of a user returned by the API.
#[derive(Serialize, Clone, Debug)]
pub struct UserPayload {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
    /// Display name shown by the front end.
    pub name: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            name: user.username.clone(),
        }
    }
}
