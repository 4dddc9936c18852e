use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    messages,
    middleware_layer::auth::{clear_session_cookie, extract_session_token, session_cookie},
    models::user::UserPayload,
    services::auth::{self as auth_service, Registration},
    state::AppState,
};

/// The request payload for user registration.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The response payload for `/api/session`.
#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPayload>,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserPayload,
}

/// The response payload for requests that only report an outcome.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Missing or malformed JSON bodies are read as an empty form so they fail
/// field validation instead of the extractor.
fn body_or_default<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("Unreadable JSON body treated as empty: {}", rejection);
            T::default()
        }
    }
}

/// Reports whether the caller holds a live session.
#[axum::debug_handler]
pub async fn session_status(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<SessionResponse>> {
    let unauthenticated = Json(SessionResponse {
        authenticated: false,
        user: None,
    });

    let Some(token) = extract_session_token(&cookies) else {
        return Ok(unauthenticated);
    };

    let user = auth_service::resolve_session(&state, &token)
        .await
        .map_err(|e| AppError::store(e, messages::SESSION_LOOKUP_FAILED))?;

    match user {
        Some(user) => Ok(Json(SessionResponse {
            authenticated: true,
            user: Some(UserPayload::from(&user)),
        })),
        None => {
            clear_session_cookie(&cookies);
            Ok(unauthenticated)
        }
    }
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = body_or_default(payload);
    tracing::info!("🔐 Login attempt for: {}", payload.username.trim());

    let user =
        auth_service::authenticate_user(state.store.as_ref(), &payload.username, &payload.password)
            .await?;

    let token =
        auth_service::start_session(&state, &user, extract_session_token(&cookies)).await;
    cookies.add(session_cookie(
        token,
        state.config.session_duration_days,
        state.config.secure_cookies,
    ));

    tracing::info!("✅ User logged in: {}", user.username);

    let response = LoginResponse {
        message: messages::LOGIN_SUCCEEDED,
        user: UserPayload::from(&user),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = body_or_default(payload);
    tracing::info!("📝 Register attempt for: {}", payload.username.trim());

    auth_service::register_user(
        state.store.as_ref(),
        Registration {
            username: payload.username,
            email: payload.email.unwrap_or_default(),
            password: payload.password,
            confirm_password: payload.confirm_password,
        },
    )
    .await?;

    let response = MessageResponse {
        message: messages::REGISTER_SUCCEEDED,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user logout. Succeeds whether or not a session existed.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Response {
    if let Some(token) = extract_session_token(&cookies) {
        if let Some(session) = state.sessions.destroy(&token).await {
            tracing::info!("👋 User logged out: {}", session.username);
        }
    }
    clear_session_cookie(&cookies);

    let response = MessageResponse {
        message: messages::LOGGED_OUT,
    };

    (StatusCode::OK, Json(response)).into_response()
}
