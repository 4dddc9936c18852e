use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use crate::config::MySqlSettings;
use crate::db;
use crate::models::user::{NewUser, User};
use crate::repositories::user::{StoreError, StoreResult, UniqueField, UserStore};

const SELECT_BY_USERNAME: &str = r#"
    SELECT id, username, email, password, role, created_at
    FROM login
    WHERE username = ?
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, username, email, password, role, created_at
    FROM login
    WHERE email = ?
"#;

const INSERT_USER: &str = r#"
    INSERT INTO login (username, email, password, role)
    VALUES (?, ?, ?, ?)
"#;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS login (
        id BIGINT NOT NULL AUTO_INCREMENT,
        username VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(50) NOT NULL DEFAULT 'user',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (id),
        UNIQUE KEY uq_login_username (username),
        UNIQUE KEY uq_login_email (email)
    ) DEFAULT CHARSET = utf8mb4
"#;

/// A user store backed by the `login` table of a MySQL database.
///
/// Every operation opens its own connection and closes it when the
/// statement finishes; there is no pool.
pub struct MySqlUserStore {
    options: MySqlConnectOptions,
}

impl MySqlUserStore {
    pub fn new(settings: &MySqlSettings) -> Self {
        Self {
            options: db::connect_options(settings),
        }
    }

    /// Creates the `login` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let mut conn = db::connect(&self.options).await?;
        let result = sqlx::query(CREATE_TABLE).execute(&mut conn).await;
        close(conn).await;
        result?;
        tracing::info!("✅ Table `login` is present");
        Ok(())
    }

    async fn fetch_one_by(&self, query: &str, value: &str) -> StoreResult<Option<User>> {
        let mut conn = db::connect(&self.options).await?;
        let user = sqlx::query_as::<_, User>(query)
            .bind(value)
            .fetch_optional(&mut conn)
            .await;
        close(conn).await;
        Ok(user?)
    }
}

async fn close(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!("MySQL connection did not close cleanly: {}", e);
    }
}

/// Maps a unique-key violation to the field it guards.
fn duplicate_field(error: &sqlx::Error) -> Option<UniqueField> {
    let db_error = error.as_database_error()?;
    if !db_error.is_unique_violation() {
        return None;
    }
    Some(field_for_key_message(db_error.message()))
}

/// Picks the violated field from a MySQL duplicate-entry message, which reads
/// "Duplicate entry '<value>' for key '<key>'" (5.7) or
/// "... for key '<table>.<key>'" (8.0). Only the key part is inspected so a
/// value that happens to contain "email" does not decide the field.
fn field_for_key_message(message: &str) -> UniqueField {
    let key = message
        .rsplit_once(" for key ")
        .map_or(message, |(_, key)| key);

    if key.to_ascii_lowercase().contains("email") {
        UniqueField::Email
    } else {
        UniqueField::Username
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    fn requires_email(&self) -> bool {
        true
    }

    async fn fetch_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.fetch_one_by(SELECT_BY_USERNAME, username).await
    }

    async fn fetch_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.fetch_one_by(SELECT_BY_EMAIL, email).await
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<()> {
        let mut conn = db::connect(&self.options).await?;
        let result = sqlx::query(INSERT_USER)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password)
            .bind(&new_user.role)
            .execute(&mut conn)
            .await;
        close(conn).await;

        match result {
            Ok(_) => {
                tracing::info!("✅ User row inserted: {}", new_user.username);
                Ok(())
            }
            Err(e) => match duplicate_field(&e) {
                Some(field) => Err(StoreError::Duplicate(field)),
                None => Err(StoreError::Unavailable(e)),
            },
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = db::connect(&self.options).await?;
        let result = conn.ping().await;
        close(conn).await;
        Ok(result?)
    }
}
