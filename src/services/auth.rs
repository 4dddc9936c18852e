use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::messages;
use crate::models::user::{NewUser, User};
use crate::repositories::user::{StoreError, StoreResult, UniqueField, UserStore};
use crate::state::AppState;
use crate::validation::auth::{sanitize_username, validate_login, validate_registration};

/// A registration form as submitted by the client.
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Compares a stored password with a submitted one.
///
/// Passwords are stored as given, so this is plain equality, evaluated in
/// constant time.
fn passwords_match(stored: &str, submitted: &str) -> bool {
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

fn conflict(field: UniqueField) -> AppError {
    match field {
        UniqueField::Username => AppError::Conflict(messages::USERNAME_TAKEN.to_string()),
        UniqueField::Email => AppError::Conflict(messages::EMAIL_TAKEN.to_string()),
    }
}

/// Authenticates a user.
///
/// # Arguments
///
/// * `store` - The user store.
/// * `username` - The submitted username, trimmed here.
/// * `password` - The submitted password.
///
/// # Returns
///
/// A `Result` containing the authenticated `User`.
pub async fn authenticate_user(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<User> {
    let username = sanitize_username(username);
    validate_login(&username, password)?;

    tracing::debug!("🔐 Authenticating user: {}", username);

    let user = store
        .fetch_by_username(&username)
        .await
        .map_err(|e| AppError::store(e, messages::LOGIN_FAILED))?
        .ok_or_else(|| AppError::Authentication(messages::INVALID_CREDENTIALS.to_string()))?;

    if !passwords_match(&user.password, password) {
        return Err(AppError::Authentication(
            messages::INVALID_CREDENTIALS.to_string(),
        ));
    }

    tracing::info!("✅ User authenticated: {}", user.username);

    Ok(user)
}

/// Registers a new user after validating the form and checking that the
/// username and email are free.
pub async fn register_user(store: &dyn UserStore, form: Registration) -> Result<()> {
    let username = sanitize_username(&form.username);
    let email = form.email.trim().to_string();

    validate_registration(
        &username,
        &email,
        store.requires_email(),
        &form.password,
        &form.confirm_password,
    )?;

    let to_app_error = |e: StoreError| match e {
        StoreError::Duplicate(field) => conflict(field),
        other => AppError::store(other, messages::REGISTER_FAILED),
    };

    if store
        .fetch_by_username(&username)
        .await
        .map_err(to_app_error)?
        .is_some()
    {
        return Err(conflict(UniqueField::Username));
    }

    let email = (!email.is_empty()).then_some(email);
    if let Some(email) = &email {
        if store.fetch_by_email(email).await.map_err(to_app_error)?.is_some() {
            return Err(conflict(UniqueField::Email));
        }
    }

    tracing::debug!("🔐 Creating user: {}", username);
    store
        .create(NewUser::new(username.clone(), email, form.password))
        .await
        .map_err(to_app_error)?;

    tracing::info!("✅ User registered: {}", username);
    Ok(())
}

/// Starts a session for `user`, ending the one identified by `previous` if any.
pub async fn start_session(state: &AppState, user: &User, previous: Option<Uuid>) -> Uuid {
    if let Some(previous) = previous {
        state.sessions.destroy(&previous).await;
    }
    let (token, _) = state.sessions.create(&user.username).await;
    token
}

/// Resolves the user bound to a session token.
///
/// Returns `Ok(None)` for unknown or expired tokens. A session whose user no
/// longer exists in the store is destroyed and also reported as `None`.
pub async fn resolve_session(state: &AppState, token: &Uuid) -> StoreResult<Option<User>> {
    let Some(session) = state.sessions.get(token).await else {
        return Ok(None);
    };

    match state.store.fetch_by_username(&session.username).await? {
        Some(user) => Ok(Some(user)),
        None => {
            tracing::warn!(
                "⚠️ Session bound to vanished user {}, resetting",
                session.username
            );
            state.sessions.destroy(token).await;
            Ok(None)
        }
    }
}
