use crate::{
    auth::{guard::Authenticated, session},
    types::{
        AppError, LoginRequest, NewUser, RegisterRequest, Result, SessionResponse, StatusMessage,
    },
    AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::{lenient_body, non_blank};

/// Register the administrator account
///
/// Only the very first account can be registered; it becomes the admin.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin registered, session cookie set", body = SessionResponse),
        (status = 400, description = "Missing fields or admin already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if state.db.user_count().await? > 0 {
        return Err(AppError::Conflict("Admin already exists".to_string()));
    }

    let payload: RegisterRequest = lenient_body(&headers, &body);
    let (Some(name), Some(email), Some(phone), Some(password)) = (
        non_blank(payload.name),
        non_blank(payload.email),
        non_blank(payload.phone),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "Please provide all required fields".to_string(),
        ));
    };

    let password_hash = state.auth_service.hash_password(&password)?;

    let user = state
        .db
        .bootstrap_admin(NewUser {
            name,
            email: email.to_lowercase(),
            phone,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "admin account registered");

    session::attach(
        &state.auth_service,
        state.config.is_production(),
        jar,
        user,
        StatusCode::CREATED,
    )
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = SessionResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Unknown email or wrong password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let payload: LoginRequest = lenient_body(&headers, &body);
    let (Some(email), Some(password)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "Both email and password are required".to_string(),
        ));
    };

    let user = state
        .db
        .get_user_by_email(&email.to_lowercase())
        .await?
        .ok_or_else(|| AppError::Auth("Invalid email".to_string()))?;

    if !state
        .auth_service
        .verify_password(&password, &user.password_hash)?
    {
        tracing::warn!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::Auth("Invalid password".to_string()));
    }

    session::attach(
        &state.auth_service,
        state.config.is_production(),
        jar,
        user,
        StatusCode::OK,
    )
}

/// Clear the session cookie
///
/// Always succeeds, with or without a session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = StatusMessage)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = session::clear(jar, state.config.is_production());

    (
        jar,
        Json(StatusMessage {
            status: "success".to_string(),
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Current signed-in user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user", body = SessionResponse),
        (status = 401, description = "No valid session")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn me(Authenticated(user): Authenticated) -> Json<SessionResponse> {
    Json(SessionResponse::success(user))
}
