use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::AppError,
    messages,
    models::user::User,
    services::auth as auth_service,
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

/// The user resolved by [`require_auth`], available to downstream handlers
/// as an `Extension`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts the session token from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
pub fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Builds the session cookie handed out on login.
pub fn session_cookie(token: Uuid, max_age_days: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::days(max_age_days));
    cookie.set_path("/");
    cookie
}

/// Tells the client to drop its session cookie.
pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookies.remove(cookie);
}

/// A middleware that requires a live session bound to an existing user.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response`, or `AppError::Unauthenticated` when no user is bound.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_session_token(&cookies).ok_or_else(|| {
        tracing::debug!("❌ No session_id cookie found");
        AppError::Unauthenticated
    })?;

    let user = auth_service::resolve_session(&state, &token)
        .await
        .map_err(|e| AppError::store(e, messages::DASHBOARD_LOAD_FAILED))?;

    let Some(user) = user else {
        tracing::warn!("❌ Session {} is not bound to a user", token);
        clear_session_cookie(&cookies);
        return Err(AppError::Unauthenticated);
    };

    tracing::debug!("✅ User authenticated: {}", user.username);

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
